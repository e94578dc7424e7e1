//! Backend capability queries consulted once when an engine is created

/// What the compute backend can do for grid fields
pub trait ComputeCapabilities: Send + Sync {
    /// Human readable adapter name
    fn adapter_name(&self) -> String;

    /// Largest width or height a single grid field may have
    fn max_grid_dimension(&self) -> u32;

    /// Whether float32 fields can be sampled with linear filtering
    fn supports_float32_linear_filter(&self) -> bool;
}

/// Capabilities of the host (CPU) backend the engine runs kernels on
#[derive(Debug, Clone, Copy)]
pub struct HostCapabilities {
    pub max_grid_dimension: u32,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            max_grid_dimension: 16384,
        }
    }
}

impl ComputeCapabilities for HostCapabilities {
    fn adapter_name(&self) -> String {
        format!("host ({} rayon threads)", rayon::current_num_threads())
    }

    fn max_grid_dimension(&self) -> u32 {
        self.max_grid_dimension
    }

    fn supports_float32_linear_filter(&self) -> bool {
        true
    }
}

/// Capabilities reported by a wgpu adapter
#[derive(Debug, Clone)]
pub struct WgpuCapabilities {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
    pub max_texture_dimension_2d: u32,
    pub float32_filterable: bool,
    pub shader_f16: bool,
}

impl WgpuCapabilities {
    /// Ask the preferred adapter for its limits. Returns `None` when no adapter exists.
    pub fn probe() -> Option<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))?;

        let info = adapter.get_info();
        let limits = adapter.limits();
        let float32_filterable = adapter
            .get_texture_format_features(wgpu::TextureFormat::Rg32Float)
            .flags
            .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE);

        let caps = Self {
            name: info.name,
            backend: info.backend,
            device_type: info.device_type,
            max_texture_dimension_2d: limits.max_texture_dimension_2d,
            float32_filterable,
            shader_f16: adapter.features().contains(wgpu::Features::SHADER_F16),
        };

        log::info!(
            "[Capabilities] Adapter '{}' ({:?}, {:?}): max 2D dimension {}, rg32float filterable: {}",
            caps.name,
            caps.backend,
            caps.device_type,
            caps.max_texture_dimension_2d,
            caps.float32_filterable
        );
        if caps.device_type == wgpu::DeviceType::Cpu {
            log::warn!("[Capabilities] Adapter is a software renderer");
        }

        Some(caps)
    }
}

impl ComputeCapabilities for WgpuCapabilities {
    fn adapter_name(&self) -> String {
        self.name.clone()
    }

    fn max_grid_dimension(&self) -> u32 {
        self.max_texture_dimension_2d
    }

    fn supports_float32_linear_filter(&self) -> bool {
        self.float32_filterable
    }
}
