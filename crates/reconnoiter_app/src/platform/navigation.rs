use reconnoiter_core::ComparisonResult;
use reconnoiter_engine::Navigator;
use reconnoiter_logging::{recon_debug, recon_error, recon_info};
use tokio::sync::mpsc;
use url::Url;

/// "Navigates" by handing the result URL to the terminal front-end.
pub struct TerminalNavigator {
    site: Url,
    opened: mpsc::UnboundedSender<Url>,
}

impl TerminalNavigator {
    pub fn new(site: Url) -> (Self, mpsc::UnboundedReceiver<Url>) {
        let (opened, opened_rx) = mpsc::unbounded_channel();
        (Self { site, opened }, opened_rx)
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, target: &ComparisonResult) {
        match comparison_url(&self.site, target) {
            Ok(url) => {
                recon_info!("comparison {} ready at {url}", target.comparison_id);
                let _ = self.opened.send(url);
            }
            Err(err) => recon_error!("no usable url for comparison {}: {err}", target.comparison_id),
        }
    }
}

/// `/comparisons/<id>` resolved against the site. A backend `redirect_url`
/// is only logged; the comparison page is always the destination.
pub fn comparison_url(site: &Url, target: &ComparisonResult) -> Result<Url, url::ParseError> {
    if let Some(redirect) = target.redirect_url.as_deref().filter(|r| !r.is_empty()) {
        recon_debug!("backend suggested {redirect} for comparison {}", target.comparison_id);
    }
    site.join(&target.path())
}
