//! Canned daemon payloads.

use serde_json::{json, Value};
use vmvault_daemon_client::DaemonResponse;

pub const DEFAULT_ID: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
pub const DEFAULT_STREAM_LOCATION: &str = "https://cloud-images.ubuntu.com/releases";
pub const DEFAULT_RELEASE_TITLE: &str = "18.04 LTS";
pub const DEFAULT_VERSION: &str = "20200519.1";
pub const OPERATION_ID: &str = "0a19a412-03d0-4118-bee8-a3095f06d4da";

/// A reply with the given status and JSON body.
pub fn json(status: u16, body: Value) -> DaemonResponse {
    DaemonResponse::new(status, body.to_string())
}

/// Plain synchronous success.
pub fn sync(metadata: Value) -> DaemonResponse {
    json(
        200,
        json!({
            "type": "sync",
            "status": "Success",
            "status_code": 200,
            "operation": "",
            "error_code": 0,
            "error": "",
            "metadata": metadata
        }),
    )
}

pub fn not_found() -> DaemonResponse {
    json(
        404,
        json!({"type": "error", "error": "not found", "error_code": 404, "metadata": null}),
    )
}

pub fn server_error(message: &str) -> DaemonResponse {
    json(
        500,
        json!({"type": "error", "error": message, "error_code": 500, "metadata": null}),
    )
}

/// Success with no metadata, as returned by deletions.
pub fn post_no_error() -> DaemonResponse {
    sync(json!({}))
}

/// Instance record created from the default image.
pub fn vm_info() -> DaemonResponse {
    sync(json!({
        "name": "pied-piper-valley",
        "status": "Running",
        "status_code": 103,
        "type": "virtual-machine",
        "config": {
            "image.release_title": DEFAULT_RELEASE_TITLE,
            "image.version": DEFAULT_VERSION,
            "image.stream_location": DEFAULT_STREAM_LOCATION,
            "volatile.base_image": DEFAULT_ID
        }
    }))
}

/// Instance record that only remembers its base image.
pub fn vm_info_without_labels() -> DaemonResponse {
    sync(json!({
        "name": "pied-piper-valley",
        "status": "Stopped",
        "status_code": 102,
        "type": "virtual-machine",
        "config": {"volatile.base_image": DEFAULT_ID}
    }))
}

/// Image record for the default image.
pub fn image_info() -> DaemonResponse {
    sync(json!({
        "fingerprint": DEFAULT_ID,
        "type": "virtual-machine",
        "properties": {
            "release_title": DEFAULT_RELEASE_TITLE,
            "version": DEFAULT_VERSION
        },
        "update_source": {"server": DEFAULT_STREAM_LOCATION, "protocol": "simplestreams"}
    }))
}

/// Async reply to an image download trigger.
pub fn image_download_task() -> DaemonResponse {
    json(
        202,
        json!({
            "type": "async",
            "status": "Operation created",
            "status_code": 100,
            "operation": format!("/1.0/operations/{OPERATION_ID}"),
            "error_code": 0,
            "error": "",
            "metadata": operation_metadata(100, Value::Null, "")
        }),
    )
}

/// Operation transferring content, 25% done.
pub fn image_downloading_task() -> DaemonResponse {
    operation(103, json!({"download_progress": "rootfs: 25% (1.20MB/s)"}), "")
}

/// Operation fetching metadata only.
pub fn metadata_downloading_task() -> DaemonResponse {
    operation(103, json!({"download_progress": "metadata: 100% (5.50MB/s)"}), "")
}

/// Finished download of `fingerprint`.
pub fn operation_success(fingerprint: &str) -> DaemonResponse {
    operation(200, json!({"fingerprint": fingerprint, "size": 342556672}), "")
}

pub fn operation_failure(err: &str) -> DaemonResponse {
    operation(400, Value::Null, err)
}

pub fn operation_cancelled() -> DaemonResponse {
    operation(401, Value::Null, "")
}

/// `GET operations/<id>` reply with the given status code.
pub fn operation(status_code: u16, metadata: Value, err: &str) -> DaemonResponse {
    sync(operation_metadata(status_code, metadata, err))
}

fn operation_metadata(status_code: u16, metadata: Value, err: &str) -> Value {
    let status = match status_code {
        100 => "Pending",
        103 => "Running",
        200 => "Success",
        401 => "Cancelled",
        _ => "Failure",
    };

    json!({
        "id": OPERATION_ID,
        "class": "task",
        "description": "Downloading image",
        "status": status,
        "status_code": status_code,
        "metadata": metadata,
        "may_cancel": true,
        "err": err
    })
}
