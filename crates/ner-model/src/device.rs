//! Compute device selection.
//!
//! Probe order: CUDA, then Metal, then CPU. The choice is made once when
//! the wrapper is constructed and never changes afterwards.

use candle_core::Device;

/// Create a device for the best available platform.
pub fn select_device(device_id: usize) -> Device {
    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(device_id) {
            Ok(device) => {
                tracing::info!("Using CUDA device {}", device_id);
                return device;
            }
            Err(e) => {
                tracing::debug!("CUDA not available: {}", e);
            }
        }
    }

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(device_id) {
            Ok(device) => {
                tracing::info!("Using Metal device {}", device_id);
                return device;
            }
            Err(e) => {
                tracing::debug!("Metal not available: {}", e);
            }
        }
    }

    #[cfg(not(any(feature = "cuda", feature = "metal")))]
    let _ = device_id;

    tracing::info!("Using CPU device");
    Device::Cpu
}

/// Human-readable device name reported by health endpoints.
pub fn device_label(device: &Device, device_id: usize) -> String {
    match device {
        Device::Cpu => "cpu".to_string(),
        Device::Cuda(_) => format!("cuda:{}", device_id),
        Device::Metal(_) => format!("metal:{}", device_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_device_always_returns_a_device() {
        // Without accelerator features this must fall back to CPU.
        let device = select_device(0);
        #[cfg(not(any(feature = "cuda", feature = "metal")))]
        assert!(matches!(device, Device::Cpu));
        let _ = device;
    }

    #[test]
    fn test_cpu_device_label() {
        assert_eq!(device_label(&Device::Cpu, 0), "cpu");
    }
}
