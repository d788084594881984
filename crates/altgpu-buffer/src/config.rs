//! Buffer configuration parameters.

use altgpu_core::ConfigError;

/// Configuration for coherent buffers.
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferConfig {
    /// Alignment of host allocations in bytes.
    ///
    /// Default: 64 (one cache line). Must be a power of two and at least
    /// [`MIN_HOST_ALIGNMENT`](Self::MIN_HOST_ALIGNMENT) so that host bytes
    /// can always be viewed as any supported element type.
    pub host_alignment: usize,
}

impl BufferConfig {
    /// Default host alignment.
    pub const DEFAULT_HOST_ALIGNMENT: usize = 64;

    /// Smallest accepted host alignment: the widest element type.
    pub const MIN_HOST_ALIGNMENT: usize = std::mem::align_of::<f64>();

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = self.host_alignment;
        if !a.is_power_of_two() || a < Self::MIN_HOST_ALIGNMENT {
            return Err(ConfigError::InvalidAlignment { alignment: a });
        }
        Ok(())
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            host_alignment: Self::DEFAULT_HOST_ALIGNMENT,
        }
    }
}
