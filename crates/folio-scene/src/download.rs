//! Avatar asset download with byte-level progress
//!
//! On the web the body of a `fetch` response is read chunk by chunk so the
//! loading indicator can follow the bytes. Native builds read the file in
//! chunks on a background thread. Either way the events land in a shared
//! queue that a system drains every frame.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bevy::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    Progress { loaded: u64, total: Option<u64> },
    Finished(Vec<u8>),
    Failed(String),
}

/// Download events waiting for the main thread
#[derive(Resource, Clone, Default)]
pub struct PendingDownload(Arc<Mutex<VecDeque<DownloadEvent>>>);

impl PendingDownload {
    pub fn push(&self, event: DownloadEvent) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push_back(event);
        }
    }

    pub fn drain(&self) -> Vec<DownloadEvent> {
        match self.0.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Start fetching `location` in the background
#[cfg(target_arch = "wasm32")]
pub fn start_download(location: String, pending: PendingDownload) {
    tracing::info!("Downloading avatar from {}", location);
    wasm_bindgen_futures::spawn_local(async move {
        match fetch_with_progress(&location, &pending).await {
            Ok(bytes) => {
                tracing::info!("Downloaded {} ({} bytes)", location, bytes.len());
                pending.push(DownloadEvent::Finished(bytes));
            }
            Err(e) => pending.push(DownloadEvent::Failed(e)),
        }
    });
}

#[cfg(target_arch = "wasm32")]
async fn fetch_with_progress(url: &str, pending: &PendingDownload) -> Result<Vec<u8>, String> {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    let window = web_sys::window().ok_or("No window")?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| format!("Fetch failed: {:?}", e))?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|_| "Fetch did not return a Response".to_string())?;

    if !response.ok() {
        return Err(format!("HTTP {}: {}", response.status(), response.status_text()));
    }

    let total = response
        .headers()
        .get("content-length")
        .ok()
        .flatten()
        .and_then(|len| len.parse::<u64>().ok());

    let Some(body) = response.body() else {
        // No stream to follow - take the whole buffer at once
        let buffer = JsFuture::from(
            response
                .array_buffer()
                .map_err(|e| format!("Failed to read body: {:?}", e))?,
        )
        .await
        .map_err(|e| format!("Failed to read body: {:?}", e))?;
        return Ok(js_sys::Uint8Array::new(&buffer).to_vec());
    };

    let reader: web_sys::ReadableStreamDefaultReader = body
        .get_reader()
        .dyn_into()
        .map_err(|_| "Body reader unavailable".to_string())?;

    let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
    pending.push(DownloadEvent::Progress { loaded: 0, total });
    loop {
        let chunk = JsFuture::from(reader.read())
            .await
            .map_err(|e| format!("Download interrupted: {:?}", e))?;
        let done = js_sys::Reflect::get(&chunk, &JsValue::from_str("done"))
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        if done {
            break;
        }
        let value = js_sys::Reflect::get(&chunk, &JsValue::from_str("value"))
            .map_err(|e| format!("Malformed chunk: {:?}", e))?;
        bytes.extend_from_slice(&js_sys::Uint8Array::new(&value).to_vec());
        pending.push(DownloadEvent::Progress {
            loaded: bytes.len() as u64,
            total,
        });
    }

    Ok(bytes)
}

/// Start reading `location` from disk on a background thread
#[cfg(not(target_arch = "wasm32"))]
pub fn start_download(location: String, pending: PendingDownload) {
    tracing::info!("Reading avatar from {}", location);
    std::thread::spawn(move || {
        match read_with_progress(std::path::Path::new(&location), &pending, CHUNK_SIZE) {
            Ok(bytes) => {
                tracing::info!("Read {} ({} bytes)", location, bytes.len());
                pending.push(DownloadEvent::Finished(bytes));
            }
            Err(e) => pending.push(DownloadEvent::Failed(format!("{}: {}", location, e))),
        }
    });
}

#[cfg(not(target_arch = "wasm32"))]
const CHUNK_SIZE: usize = 64 * 1024;

/// Read a file in `chunk_size` pieces, reporting progress after each one
#[cfg(not(target_arch = "wasm32"))]
pub fn read_with_progress(
    path: &std::path::Path,
    pending: &PendingDownload,
    chunk_size: usize,
) -> std::io::Result<Vec<u8>> {
    use std::io::Read;

    let mut file = std::fs::File::open(path)?;
    let total = file.metadata().ok().map(|m| m.len()).filter(|len| *len > 0);
    let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = vec![0u8; chunk_size.max(1)];

    pending.push(DownloadEvent::Progress { loaded: 0, total });
    loop {
        let read = file.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..read]);
        pending.push(DownloadEvent::Progress {
            loaded: bytes.len() as u64,
            total,
        });
    }
    Ok(bytes)
}
