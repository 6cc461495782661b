use std::path::PathBuf;

const PROTO: &str = "proto/books/v1/books.proto";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed={PROTO}");
    println!("cargo:rerun-if-changed=proto");
    println!("cargo:rerun-if-env-changed=PROTOC");

    let mut includes = vec![PathBuf::from("proto")];
    let mut config = prost_build::Config::new();

    // Prefer an explicitly configured protoc, fall back to the vendored one.
    if std::env::var_os("PROTOC").is_none() {
        config.protoc_executable(protoc_bin_vendored::protoc_bin_path()?);
        includes.push(protoc_bin_vendored::include_path()?);
    }

    tonic_prost_build::configure()
        .build_client(true)
        .build_server(true)
        .generate_default_stubs(true)
        .compile_with_config(config, &[PathBuf::from(PROTO)], &includes)?;

    Ok(())
}
