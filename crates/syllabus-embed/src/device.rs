use candle_core::Device;
use tracing::info;

/// Pick the accelerator compiled in, falling back to CPU.
pub fn select_device() -> Device {
    #[cfg(feature = "cuda")]
    match Device::new_cuda(0) {
        Ok(dev) => { info!(device = "cuda:0", "embedding device selected"); return dev; }
        Err(e) => tracing::warn!(error = %e, "CUDA unavailable"),
    }
    #[cfg(feature = "metal")]
    match Device::new_metal(0) {
        Ok(dev) => { info!(device = "metal:0", "embedding device selected"); return dev; }
        Err(e) => tracing::warn!(error = %e, "Metal unavailable"),
    }
    info!(device = "cpu", "embedding device selected");
    Device::Cpu
}
