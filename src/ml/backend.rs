// ============================================================
// Layer 5 — Backend Selection
// ============================================================
// Training runs on WGPU by default; the NdArray CPU backend is
// the fallback when no usable GPU adapter exists.

use serde::{Deserialize, Serialize};

pub type WgpuBackend      = burn::backend::Wgpu;
pub type WgpuTrainBackend = burn::backend::Autodiff<WgpuBackend>;
pub type CpuBackend       = burn::backend::NdArray<f32>;
pub type CpuTrainBackend  = burn::backend::Autodiff<CpuBackend>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Wgpu,
    Cpu,
}

pub fn wgpu_device() -> burn::backend::wgpu::WgpuDevice {
    burn::backend::wgpu::WgpuDevice::default()
}

pub fn cpu_device() -> burn::backend::ndarray::NdArrayDevice {
    burn::backend::ndarray::NdArrayDevice::Cpu
}
