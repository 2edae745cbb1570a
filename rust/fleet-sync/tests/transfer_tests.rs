/*
 * Copyright 2025 Carver Automation Corporation.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Tests for the directory-backed file transfer.

use fleet_sync::transfer::{FileTransfer, LocalDirTransfer};
use fleet_sync::Error;
use tempfile::TempDir;

#[test]
fn test_resolve_stays_under_root() {
    let dir = TempDir::new().unwrap();
    let transfer = LocalDirTransfer::new(dir.path(), "reports");

    let path = transfer.resolve("Export/geotab/roster.csv").unwrap();
    assert_eq!(path, dir.path().join("Export").join("geotab").join("roster.csv"));
    assert_eq!(transfer.resolve("./a.csv").unwrap(), dir.path().join("a.csv"));
}

#[test]
fn test_resolve_rejects_escapes() {
    let dir = TempDir::new().unwrap();
    let transfer = LocalDirTransfer::new(dir.path(), "");

    for path in ["../secret", "Export/../../secret", "/etc/passwd", "", "."] {
        assert!(
            matches!(transfer.resolve(path), Err(Error::Transfer { .. })),
            "{path} should be rejected"
        );
    }
}

#[tokio::test]
async fn test_upload_creates_directory_and_download_reads_back() {
    let dir = TempDir::new().unwrap();
    let transfer = LocalDirTransfer::new(dir.path(), "/outbound/reports/");

    transfer.upload_file(b"a,b\n1,2\n", "report.csv").await.unwrap();
    let written = dir.path().join("outbound").join("reports").join("report.csv");
    assert_eq!(std::fs::read(&written).unwrap(), b"a,b\n1,2\n");

    let bytes = transfer
        .download_file("outbound/reports/report.csv")
        .await
        .unwrap();
    assert_eq!(bytes, b"a,b\n1,2\n");
}

#[tokio::test]
async fn test_download_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let transfer = LocalDirTransfer::new(dir.path(), "");

    let err = transfer.download_file("missing.csv").await.unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[tokio::test]
async fn test_upload_rejects_traversal_in_name() {
    let dir = TempDir::new().unwrap();
    let transfer = LocalDirTransfer::new(dir.path(), "reports");

    let err = transfer.upload_file(b"x", "../escape.csv").await.unwrap_err();
    assert!(matches!(err, Error::Transfer { .. }));
    assert!(!dir.path().join("escape.csv").exists());
}
