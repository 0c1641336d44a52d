use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use image::RgbaImage;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{
    extract_palette_with, generate_palette, Palette, PaletteError, PaletteResult, PaletteType,
};
use crate::geometry::Argb;

/// Palette computation running on its own thread.
///
/// The result arrives once over a channel. A cancelled job delivers
/// `PaletteError::Cancelled` and never a partial palette.
#[derive(Debug)]
pub struct PaletteJob {
    receiver: mpsc::Receiver<PaletteResult<Palette>>,
    cancel: Arc<AtomicBool>,
}

impl PaletteJob {
    fn spawn<W>(work: W) -> Self
    where
        W: FnOnce(&AtomicBool) -> PaletteResult<Palette> + Send + 'static,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let result = work(&flag).and_then(|palette| {
                if flag.load(Ordering::Relaxed) {
                    Err(PaletteError::Cancelled)
                } else {
                    Ok(palette)
                }
            });
            if let Err(err) = &result {
                tracing::debug!(%err, "palette job finished without a palette");
            }
            let _ = tx.send(result);
        });
        Self {
            receiver: rx,
            cancel,
        }
    }

    pub fn spawn_generate(base: Argb, palette_type: PaletteType, count: usize) -> Self {
        Self::spawn(move |_| {
            let mut rng = StdRng::from_entropy();
            generate_palette(base, palette_type, count, &mut rng)
        })
    }

    pub fn spawn_extract(image: RgbaImage, count: usize, sample_budget: usize) -> Self {
        Self::spawn(move |cancel| {
            let mut rng = StdRng::from_entropy();
            extract_palette_with(&image, count, sample_budget, &mut rng, Some(cancel))
        })
    }

    /// Asks the worker to stop at its next checkpoint.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Non-blocking poll; `None` while the worker is still running.
    pub fn try_recv(&self) -> Option<PaletteResult<Palette>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(PaletteError::WorkerDisconnected)),
        }
    }

    pub fn wait(self) -> PaletteResult<Palette> {
        self.receiver
            .recv()
            .unwrap_or(Err(PaletteError::WorkerDisconnected))
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    #[test]
    fn generate_job_delivers_palette() {
        let job = PaletteJob::spawn_generate(Argb::from_rgb(40, 90, 200), PaletteType::Tetradic, 6);
        let palette = job.wait().expect("palette");
        assert_eq!(palette.colors.len(), 6);
        assert_eq!(palette.palette_type, Some(PaletteType::Tetradic));
    }

    #[test]
    fn extract_job_delivers_palette() {
        let image = RgbaImage::from_pixel(64, 64, Rgba([5, 6, 7, 255]));
        let job = PaletteJob::spawn_extract(image, 2, 1_000);
        let palette = job.wait().expect("palette");
        assert_eq!(palette.colors, vec![Argb::from_rgb(5, 6, 7); 2]);
    }

    #[test]
    fn cancelled_job_never_yields_a_palette() {
        let job = PaletteJob::spawn(|cancel| {
            while !cancel.load(Ordering::Relaxed) {
                std::thread::yield_now();
            }
            Err(PaletteError::Cancelled)
        });
        job.cancel();
        assert!(job.is_cancelled());
        assert_eq!(job.wait(), Err(PaletteError::Cancelled));
    }

    #[test]
    fn cancel_after_work_still_discards_the_palette() {
        let (ready_tx, ready_rx) = mpsc::channel::<()>();
        let (go_tx, go_rx) = mpsc::channel::<()>();
        let job = PaletteJob::spawn(move |_| {
            let mut rng = StdRng::seed_from_u64(1);
            let palette = generate_palette(Argb::BLACK, PaletteType::Triadic, 3, &mut rng);
            let _ = ready_tx.send(());
            let _ = go_rx.recv();
            palette
        });
        ready_rx.recv().expect("worker ready");
        job.cancel();
        go_tx.send(()).expect("release worker");
        assert_eq!(job.wait(), Err(PaletteError::Cancelled));
    }
}
