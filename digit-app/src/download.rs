//! Browser downloads via a synthetic anchor click.

use digit_gateway::{Download, DownloadTarget, GatewayError, GatewayResult};
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlAnchorElement};

/// Delivers downloads by clicking a detached `<a download>` element.
pub(crate) struct AnchorDownload {
    document: Document,
}

impl AnchorDownload {
    pub(crate) fn new(document: Document) -> Self {
        Self { document }
    }
}

impl DownloadTarget for AnchorDownload {
    fn deliver(&self, download: &Download) -> GatewayResult<()> {
        let link = self
            .document
            .create_element("a")
            .map_err(|e| GatewayError::Download(format!("{e:?}")))?
            .dyn_into::<HtmlAnchorElement>()
            .map_err(|_| GatewayError::Download("Element is not an anchor".to_string()))?;

        link.set_href(&download.image.to_data_url());
        link.set_download(&download.file_name);
        link.click();

        tracing::info!(file = %download.file_name, "Download triggered");
        Ok(())
    }
}
