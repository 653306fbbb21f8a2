//! Tests for the upload subcommand.

use super::parse;
use crate::cli::CliCommand;
use std::path::Path;

#[test]
fn cli_parse_upload_defaults() {
    match parse(&["chunkup", "upload", "3", "/tmp/video.mp4"]) {
        CliCommand::Upload {
            id,
            path,
            name,
            chunk_size,
            skip_if_unchanged,
        } => {
            assert_eq!(id, 3);
            assert_eq!(path, Path::new("/tmp/video.mp4"));
            assert!(name.is_none());
            assert!(chunk_size.is_none());
            assert!(!skip_if_unchanged);
        }
        _ => panic!("expected Upload"),
    }
}

#[test]
fn cli_parse_upload_options() {
    match parse(&[
        "chunkup",
        "upload",
        "3",
        "local.bin",
        "--name",
        "remote.bin",
        "--chunk-size",
        "1048576",
        "--skip-if-unchanged",
    ]) {
        CliCommand::Upload {
            name,
            chunk_size,
            skip_if_unchanged,
            ..
        } => {
            assert_eq!(name.as_deref(), Some("remote.bin"));
            assert_eq!(chunk_size, Some(1_048_576));
            assert!(skip_if_unchanged);
        }
        _ => panic!("expected Upload with options"),
    }
}
