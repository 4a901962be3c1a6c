use pinhole_core::StoreError;
use pinhole_generator::Generator;
use pinhole_proto_schema::v1 as proto;
use pinhole_proto_schema::v1::shortener_service_server::ShortenerService as ShortenerServiceProto;
use pinhole_shortener::{BatchItem, Resolution, ShortenerError, ShortenerService};
use std::sync::Arc;
use tonic::{Request, Response, Status};

pub struct ShortenerGrpcServer<G> {
    service: Arc<ShortenerService<G>>,
}

impl<G: Generator> ShortenerGrpcServer<G> {
    pub fn new(service: Arc<ShortenerService<G>>) -> Self {
        Self { service }
    }
}

/// Pulls the opaque, already-authenticated user id out of request
/// metadata. Identity resolution happens upstream; this server only
/// requires that it is present.
fn user_id_from_metadata<T>(request: &Request<T>) -> Result<String, Status> {
    let value = request
        .metadata()
        .get("user-id")
        .ok_or_else(|| Status::unauthenticated("user-id metadata is missing"))?;

    let user_id = value
        .to_str()
        .map_err(|_| Status::unauthenticated("user-id metadata is not valid ascii"))?;

    if user_id.is_empty() {
        return Err(Status::unauthenticated("user-id metadata is empty"));
    }

    Ok(user_id.to_owned())
}

fn to_status(err: ShortenerError) -> Status {
    let message = err.to_string();
    match err {
        ShortenerError::EmptyUrl
        | ShortenerError::InvalidUrl(_)
        | ShortenerError::EmptyIdList
        | ShortenerError::EmptyBatch => Status::invalid_argument(message),
        ShortenerError::IdGeneration(_) => Status::internal(message),
        // A generated id colliding with an existing record is a failure
        // of this service, not of the backend.
        ShortenerError::Storage(StoreError::Conflict(_)) => Status::internal(message),
        ShortenerError::Storage(StoreError::Unavailable(_)) => Status::unavailable(message),
        ShortenerError::Storage(_) => Status::internal(message),
    }
}

#[tonic::async_trait]
impl<G: Generator> ShortenerServiceProto for ShortenerGrpcServer<G> {
    async fn create(
        &self,
        request: Request<proto::CreateRequest>,
    ) -> Result<Response<proto::CreateResponse>, Status> {
        let user_id = user_id_from_metadata(&request)?;
        let req = request.into_inner();

        let created = self
            .service
            .create(&req.original_url, &user_id)
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::CreateResponse {
            short_id: created.short_id,
            short_url: created.short_url,
            existed: created.existed,
        }))
    }

    async fn create_batch(
        &self,
        request: Request<proto::CreateBatchRequest>,
    ) -> Result<Response<proto::CreateBatchResponse>, Status> {
        let user_id = user_id_from_metadata(&request)?;
        let req = request.into_inner();

        let items = req
            .items
            .into_iter()
            .map(|item| BatchItem {
                correlation_id: item.correlation_id,
                original_url: item.original_url,
            })
            .collect();

        let results = self
            .service
            .create_batch(items, &user_id)
            .await
            .map_err(to_status)?
            .into_iter()
            .map(|result| proto::BatchResult {
                correlation_id: result.correlation_id,
                short_url: result.short_url,
            })
            .collect();

        Ok(Response::new(proto::CreateBatchResponse { results }))
    }

    async fn resolve(
        &self,
        request: Request<proto::ResolveRequest>,
    ) -> Result<Response<proto::ResolveResponse>, Status> {
        let req = request.into_inner();

        match self
            .service
            .resolve(&req.short_id)
            .await
            .map_err(to_status)?
        {
            Resolution::Found(original_url) => Ok(Response::new(proto::ResolveResponse {
                original_url,
                deleted: false,
            })),
            Resolution::Gone => Ok(Response::new(proto::ResolveResponse {
                original_url: String::new(),
                deleted: true,
            })),
            Resolution::NotFound => Err(Status::not_found(format!(
                "short id not found: {}",
                req.short_id
            ))),
        }
    }

    async fn list_user_urls(
        &self,
        request: Request<proto::ListUserUrlsRequest>,
    ) -> Result<Response<proto::ListUserUrlsResponse>, Status> {
        let user_id = user_id_from_metadata(&request)?;

        let urls = self
            .service
            .user_urls(&user_id)
            .await
            .map_err(to_status)?
            .into_iter()
            .map(|u| proto::UserUrl {
                short_id: u.short_id,
                short_url: u.short_url,
                original_url: u.original_url,
            })
            .collect();

        Ok(Response::new(proto::ListUserUrlsResponse { urls }))
    }

    async fn delete_user_urls(
        &self,
        request: Request<proto::DeleteUserUrlsRequest>,
    ) -> Result<Response<proto::DeleteUserUrlsResponse>, Status> {
        let user_id = user_id_from_metadata(&request)?;
        let req = request.into_inner();

        self.service
            .delete_user_urls(&user_id, req.short_ids)
            .map_err(to_status)?;

        // The batch is accepted, not applied; deletion is asynchronous
        // and best-effort.
        Ok(Response::new(proto::DeleteUserUrlsResponse {}))
    }

    async fn stats(
        &self,
        _request: Request<proto::StatsRequest>,
    ) -> Result<Response<proto::StatsResponse>, Status> {
        let stats = self.service.stats().await.map_err(to_status)?;

        Ok(Response::new(proto::StatsResponse {
            urls: stats.urls,
            users: stats.users,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn validation_errors_map_to_invalid_argument() {
        for err in [
            ShortenerError::EmptyUrl,
            ShortenerError::InvalidUrl("no scheme".to_owned()),
            ShortenerError::EmptyIdList,
            ShortenerError::EmptyBatch,
        ] {
            assert_eq!(to_status(err).code(), Code::InvalidArgument);
        }
    }

    #[test]
    fn id_collision_is_internal_not_unavailable() {
        let status = to_status(ShortenerError::Storage(StoreError::Conflict(
            "abc12345".to_owned(),
        )));
        assert_eq!(status.code(), Code::Internal);
    }

    #[test]
    fn backend_outage_maps_to_unavailable() {
        let status = to_status(ShortenerError::Storage(StoreError::Unavailable(
            "pool closed".to_owned(),
        )));
        assert_eq!(status.code(), Code::Unavailable);
    }

    #[test]
    fn query_failures_map_to_internal() {
        let status = to_status(ShortenerError::Storage(StoreError::Query(
            "syntax error".to_owned(),
        )));
        assert_eq!(status.code(), Code::Internal);
    }
}
