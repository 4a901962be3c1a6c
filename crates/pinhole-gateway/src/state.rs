use pinhole_generator::RandomGenerator;
use pinhole_shortener::ShortenerService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    service: Arc<ShortenerService<RandomGenerator>>,
}

impl AppState {
    pub fn new(service: Arc<ShortenerService<RandomGenerator>>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &ShortenerService<RandomGenerator> {
        &self.service
    }
}
