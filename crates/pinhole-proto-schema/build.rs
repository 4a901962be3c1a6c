fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto = "proto/shortener/v1/shortener.proto";
    let protoc = std::env::var("PROTOC").unwrap_or_else(|_| "protoc".to_string());
    let have_protoc = std::process::Command::new(protoc)
        .arg("--version")
        .output()
        .is_ok();

    if have_protoc {
        tonic_prost_build::compile_protos(proto)?;
    } else {
        // Environments without protoc use the committed descriptor set,
        // which was generated from the same proto file.
        tonic_prost_build::configure()
            .file_descriptor_set_path("proto/shortener/v1/shortener.fds")
            .skip_protoc_run()
            .compile_protos(&[proto], &["proto"])?;
    }
    Ok(())
}
