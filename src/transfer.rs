//! Turn a downloaded payload into a browser file save.

use tracing::{info, warn};
use wasm_bindgen::JsCast;

use crate::api::{ApiClient, Transport};
use crate::error::DownloadFailure;
use crate::workflow::is_absolute;

const XLSX_EXPORT_PATH: &str = "/download/dev-xlsx";
const XLSX_FILENAME: &str = "timetables.xlsx";
const CSV_FALLBACK_FILENAME: &str = "timetable.csv";

/// Platform file-save mechanism working through temporary handles.
pub trait FileSink {
    fn acquire(&self, bytes: &[u8]) -> Result<String, DownloadFailure>;
    fn deliver(&self, handle: &str, filename: &str) -> Result<(), DownloadFailure>;
    fn release(&self, handle: &str);
}

/// Releases its handle when dropped, whichever way the save went.
struct HeldHandle<'a, S: FileSink + ?Sized> {
    sink: &'a S,
    handle: String,
}

impl<S: FileSink + ?Sized> Drop for HeldHandle<'_, S> {
    fn drop(&mut self) {
        self.sink.release(&self.handle);
    }
}

pub fn save_payload<S: FileSink + ?Sized>(
    sink: &S,
    bytes: &[u8],
    filename: &str,
) -> Result<(), DownloadFailure> {
    let held = HeldHandle {
        sink,
        handle: sink.acquire(bytes)?,
    };
    sink.deliver(&held.handle, filename)
}

pub async fn save_as<T: Transport, S: FileSink + ?Sized>(
    client: &ApiClient<T>,
    sink: &S,
    source_ref: &str,
    suggested_name: &str,
) -> Result<(), DownloadFailure> {
    let url = if is_absolute(source_ref) {
        source_ref.to_string()
    } else {
        client.url_for(source_ref)
    };
    let bytes = client.fetch_bytes(&url).await.map_err(|e| {
        warn!("Download of {} failed: {}", url, e);
        DownloadFailure::from(e)
    })?;
    save_payload(sink, &bytes, suggested_name)?;
    info!("Saved {} ({} bytes) as {}", url, bytes.len(), suggested_name);
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// CSV artifact behind the current dataset.
    Csv(String),
    Xlsx,
}

impl ExportTarget {
    pub fn source_ref(&self) -> &str {
        match self {
            ExportTarget::Csv(download_ref) => download_ref,
            ExportTarget::Xlsx => XLSX_EXPORT_PATH,
        }
    }

    pub fn suggested_name(&self) -> String {
        match self {
            ExportTarget::Csv(download_ref) => download_ref
                .rsplit('/')
                .next()
                .filter(|name| !name.is_empty())
                .unwrap_or(CSV_FALLBACK_FILENAME)
                .to_string(),
            ExportTarget::Xlsx => XLSX_FILENAME.to_string(),
        }
    }
}

/// Blob + object URL + synthetic anchor click.
pub struct BrowserSink;

impl FileSink for BrowserSink {
    fn acquire(&self, bytes: &[u8]) -> Result<String, DownloadFailure> {
        let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
        let blob = web_sys::Blob::new_with_u8_array_sequence(&parts).map_err(js_failure)?;
        web_sys::Url::create_object_url_with_blob(&blob).map_err(js_failure)
    }

    fn deliver(&self, handle: &str, filename: &str) -> Result<(), DownloadFailure> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| DownloadFailure::Platform("no document".to_string()))?;
        let anchor = document
            .create_element("a")
            .map_err(js_failure)?
            .dyn_into::<web_sys::HtmlAnchorElement>()
            .map_err(|_| DownloadFailure::Platform("anchor element unavailable".to_string()))?;
        anchor.set_href(handle);
        anchor.set_download(filename);
        anchor.click();
        Ok(())
    }

    fn release(&self, handle: &str) {
        let _ = web_sys::Url::revoke_object_url(handle);
    }
}

fn js_failure(err: wasm_bindgen::JsValue) -> DownloadFailure {
    DownloadFailure::Platform(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use futures::executor::block_on;

    use super::*;
    use crate::api::Method;
    use crate::testing::{client_with, ScriptedTransport};

    #[derive(Default)]
    struct RecordingSink {
        events: RefCell<Vec<String>>,
        refuse_delivery: bool,
    }

    impl FileSink for RecordingSink {
        fn acquire(&self, bytes: &[u8]) -> Result<String, DownloadFailure> {
            self.events
                .borrow_mut()
                .push(format!("acquire {}", bytes.len()));
            Ok("blob:1".to_string())
        }

        fn deliver(&self, handle: &str, filename: &str) -> Result<(), DownloadFailure> {
            if self.refuse_delivery {
                return Err(DownloadFailure::Platform("blocked".into()));
            }
            self.events
                .borrow_mut()
                .push(format!("deliver {} {}", handle, filename));
            Ok(())
        }

        fn release(&self, handle: &str) {
            self.events.borrow_mut().push(format!("release {}", handle));
        }
    }

    #[test]
    fn test_save_as_delivers_then_releases() {
        let transport = ScriptedTransport::new();
        transport.reply(Method::Get, "http://svc.test/download/t.csv", 200, "a,b\n1,2\n");
        let sink = RecordingSink::default();
        block_on(save_as(&client_with(transport), &sink, "/download/t.csv", "t.csv")).unwrap();
        assert_eq!(
            *sink.events.borrow(),
            vec!["acquire 8", "deliver blob:1 t.csv", "release blob:1"]
        );
    }

    #[test]
    fn test_handle_released_when_delivery_fails() {
        let sink = RecordingSink {
            refuse_delivery: true,
            ..Default::default()
        };
        let err = save_payload(&sink, b"xyz", "t.csv").unwrap_err();
        assert!(matches!(err, DownloadFailure::Platform(_)));
        assert_eq!(*sink.events.borrow(), vec!["acquire 3", "release blob:1"]);
    }

    #[test]
    fn test_http_error_carries_status_and_saves_nothing() {
        let transport = ScriptedTransport::new();
        transport.reply(
            Method::Get,
            "http://svc.test/download/dev-xlsx",
            404,
            r#"{"detail":"Dev XLSX not found on server"}"#,
        );
        let sink = RecordingSink::default();
        let target = ExportTarget::Xlsx;
        let err = block_on(save_as(
            &client_with(transport),
            &sink,
            target.source_ref(),
            &target.suggested_name(),
        ))
        .unwrap_err();
        assert_eq!(err, DownloadFailure::ServiceError(404));
        assert!(sink.events.borrow().is_empty());
    }

    #[test]
    fn test_absolute_source_used_as_is() {
        let transport = ScriptedTransport::new();
        transport.reply(Method::Get, "https://files.test/x.csv", 200, "x");
        let sink = RecordingSink::default();
        block_on(save_as(
            &client_with(transport.clone()),
            &sink,
            "https://files.test/x.csv",
            "x.csv",
        ))
        .unwrap();
        assert_eq!(transport.requests()[0].url, "https://files.test/x.csv");
    }

    #[test]
    fn test_export_names() {
        assert_eq!(
            ExportTarget::Csv("/download/timetable_17.csv".into()).suggested_name(),
            "timetable_17.csv"
        );
        assert_eq!(ExportTarget::Csv("/download/".into()).suggested_name(), "timetable.csv");
        assert_eq!(ExportTarget::Xlsx.source_ref(), "/download/dev-xlsx");
    }
}
