use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Unable to find a suitable adapter")]
    NoAdapterFound,
    #[error("Unable to create a device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("Unable to map output buffer: {0}")]
    BufferAsync(#[from] wgpu::BufferAsyncError),
    #[error("Output buffer map callback was dropped")]
    MapCallbackDropped,
    #[error("Output size {0}x{1} is empty, upload an image or set an output size first")]
    EmptyOutput(u32, u32),
    #[error("Size {width}x{height} exceeds the device texture limit of {max}")]
    OutputTooLarge { width: u32, height: u32, max: u32 },
    #[error("Expected {expected} bytes of rgba pixels but got {actual}")]
    PixelBufferSize { expected: usize, actual: usize },
    #[error("Unable to encode uniform buffer: {0}")]
    UniformEncode(#[from] encase::internal::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
