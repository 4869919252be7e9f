use std::thread::JoinHandle;

use crossbeam_channel::Sender;

use crate::overlay::domain::overlay_renderer::OverlayRenderer;
use crate::shared::overlay_image::OverlayImage;

const RENDER_THREAD_NAME: &str = "overlay-render";

struct RenderRequest {
    target: (u32, u32),
    reply: Sender<Result<OverlayImage, String>>,
}

/// Owns the one thread allowed to rasterize overlays.
///
/// Callers hand over a target size and block until the finished image
/// comes back. The renderer itself never leaves the render thread.
pub struct RenderContext {
    request_tx: Option<Sender<RenderRequest>>,
    handle: Option<JoinHandle<()>>,
}

impl RenderContext {
    pub fn spawn(renderer: Box<dyn OverlayRenderer>) -> Result<Self, Box<dyn std::error::Error>> {
        let (request_tx, request_rx) = crossbeam_channel::bounded::<RenderRequest>(1);

        let handle = std::thread::Builder::new()
            .name(RENDER_THREAD_NAME.to_string())
            .spawn(move || {
                for request in request_rx.iter() {
                    let result = renderer.render(request.target).map_err(|e| e.to_string());
                    let _ = request.reply.send(result);
                }
            })?;

        Ok(Self {
            request_tx: Some(request_tx),
            handle: Some(handle),
        })
    }

    /// Renders the overlay for `target` on the render thread and waits
    /// for the result.
    pub fn request(&self, target: (u32, u32)) -> Result<OverlayImage, Box<dyn std::error::Error>> {
        let tx = self
            .request_tx
            .as_ref()
            .ok_or("overlay render thread stopped")?;
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        tx.send(RenderRequest {
            target,
            reply: reply_tx,
        })
        .map_err(|_| "overlay render thread stopped")?;

        match reply_rx.recv() {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err("overlay render thread exited without answering".into()),
        }
    }
}

impl Drop for RenderContext {
    fn drop(&mut self) {
        self.request_tx = None;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
