//! Grid fields: typed 2D (or 1D) texel arrays with optional ping-pong buffering

use bytemuck::Pod;
use glam::Vec2;
use rayon::prelude::*;
use std::fmt::Debug;

use super::GpuError;

/// Numeric storage type a field declares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericType {
    Float32,
    Float16,
    Int16,
    Int32,
}

impl NumericType {
    pub fn is_float(&self) -> bool {
        matches!(self, NumericType::Float32 | NumericType::Float16)
    }
}

/// Behaviour of lookups that fall outside the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    Clamp,
    Repeat,
}

/// Sampler filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Per-texel value stored in a grid field
pub trait Texel: Pod + Default + Debug + PartialEq + Send + Sync {
    const COMPONENTS: u8;
    const NUMERIC_TYPE: NumericType;

    /// Linear blend used by the bilinear sampler
    fn lerp(a: Self, b: Self, t: f32) -> Self;
}

impl Texel for f32 {
    const COMPONENTS: u8 = 1;
    const NUMERIC_TYPE: NumericType = NumericType::Float32;

    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }
}

impl Texel for [f32; 2] {
    const COMPONENTS: u8 = 2;
    const NUMERIC_TYPE: NumericType = NumericType::Float32;

    fn lerp(a: Self, b: Self, t: f32) -> Self {
        [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
    }
}

impl Texel for [f32; 4] {
    const COMPONENTS: u8 = 4;
    const NUMERIC_TYPE: NumericType = NumericType::Float32;

    fn lerp(a: Self, b: Self, t: f32) -> Self {
        [
            a[0] + (b[0] - a[0]) * t,
            a[1] + (b[1] - a[1]) * t,
            a[2] + (b[2] - a[2]) * t,
            a[3] + (b[3] - a[3]) * t,
        ]
    }
}

impl Texel for i16 {
    const COMPONENTS: u8 = 1;
    const NUMERIC_TYPE: NumericType = NumericType::Int16;

    // Integer fields are never linearly filtered
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        if t < 0.5 { a } else { b }
    }
}

impl Texel for i32 {
    const COMPONENTS: u8 = 1;
    const NUMERIC_TYPE: NumericType = NumericType::Int32;

    fn lerp(a: Self, b: Self, t: f32) -> Self {
        if t < 0.5 { a } else { b }
    }
}

/// Static description of a field. Survives every resize.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub numeric_type: NumericType,
    pub wrap_x: WrapMode,
    pub wrap_y: WrapMode,
    pub filter: FilterMode,
    pub buffer_count: u8,
    /// Widest row a 1D field may use before wrapping onto the next row
    pub max_row_width: Option<u32>,
}

impl FieldDescriptor {
    /// Descriptor with nearest filtering, clamped edges and one buffer
    pub fn new(name: &'static str, numeric_type: NumericType) -> Self {
        Self {
            name,
            numeric_type,
            wrap_x: WrapMode::Clamp,
            wrap_y: WrapMode::Clamp,
            filter: FilterMode::Nearest,
            buffer_count: 1,
            max_row_width: None,
        }
    }

    pub fn with_wrap(mut self, wrap: WrapMode) -> Self {
        self.wrap_x = wrap;
        self.wrap_y = wrap;
        self
    }

    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    pub fn double_buffered(mut self) -> Self {
        self.buffer_count = 2;
        self
    }

    /// Pack 1D fields into rows of at most `max_row_width` texels
    pub fn packed(mut self, max_row_width: u32) -> Self {
        self.max_row_width = Some(max_row_width);
        self
    }

    /// Width and height a 1D field of `len` elements occupies
    pub fn packed_size(&self, len: u32) -> (u32, u32) {
        let width = match self.max_row_width {
            Some(max) => len.min(max.max(1)),
            None => len,
        };
        if width == 0 {
            return (0, 0);
        }
        (width, len.div_ceil(width))
    }

    fn validate<T: Texel>(&self) -> Result<(), GpuError> {
        if self.buffer_count == 0 || self.buffer_count > 2 {
            return Err(GpuError::InvalidDescriptor(format!(
                "{}: buffer count must be 1 or 2, got {}",
                self.name, self.buffer_count
            )));
        }
        if self.numeric_type.is_float() != T::NUMERIC_TYPE.is_float() {
            return Err(GpuError::InvalidDescriptor(format!(
                "{}: declared {:?} but texel type stores {:?}",
                self.name, self.numeric_type, T::NUMERIC_TYPE
            )));
        }
        if self.filter == FilterMode::Linear && !self.numeric_type.is_float() {
            return Err(GpuError::InvalidDescriptor(format!(
                "{}: integer fields cannot be linearly filtered",
                self.name
            )));
        }
        Ok(())
    }
}

/// Read-only sampler over one buffer of a field
#[derive(Clone, Copy)]
pub struct FieldView<'a, T: Texel> {
    data: &'a [T],
    width: u32,
    height: u32,
    wrap_x: WrapMode,
    wrap_y: WrapMode,
    filter: FilterMode,
}

impl<'a, T: Texel> FieldView<'a, T> {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &'a [T] {
        self.data
    }

    /// Linear element index of texel `(x, y)`
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Fetch one texel, applying the wrap mode to out-of-range coordinates
    #[inline]
    pub fn texel(&self, x: i64, y: i64) -> T {
        let x = wrap_coord(x, self.width, self.wrap_x);
        let y = wrap_coord(y, self.height, self.wrap_y);
        self.data[y * self.width as usize + x]
    }

    /// Index-space lookup of a 1D field
    #[inline]
    pub fn at(&self, index: usize) -> T {
        self.data[index]
    }

    /// Sample at normalised coordinates using the field's filter
    pub fn sample(&self, uv: Vec2) -> T {
        match self.filter {
            FilterMode::Nearest => self.sample_nearest(uv),
            FilterMode::Linear => {
                let px = uv.x * self.width as f32 - 0.5;
                let py = uv.y * self.height as f32 - 0.5;
                let x0 = px.floor();
                let y0 = py.floor();
                let tx = px - x0;
                let ty = py - y0;
                let (x0, y0) = (x0 as i64, y0 as i64);

                let bottom = T::lerp(self.texel(x0, y0), self.texel(x0 + 1, y0), tx);
                let top = T::lerp(self.texel(x0, y0 + 1), self.texel(x0 + 1, y0 + 1), tx);
                T::lerp(bottom, top, ty)
            }
        }
    }

    /// Sample ignoring the declared filter
    pub fn sample_nearest(&self, uv: Vec2) -> T {
        let x = (uv.x * self.width as f32).floor() as i64;
        let y = (uv.y * self.height as f32).floor() as i64;
        self.texel(x, y)
    }

    /// Normalised coordinate of a texel centre
    #[inline]
    pub fn texel_uv(&self, x: u32, y: u32) -> Vec2 {
        Vec2::new(
            (x as f32 + 0.5) / self.width as f32,
            (y as f32 + 0.5) / self.height as f32,
        )
    }
}

#[inline]
fn wrap_coord(c: i64, size: u32, mode: WrapMode) -> usize {
    let size = size as i64;
    match mode {
        WrapMode::Repeat => c.rem_euclid(size) as usize,
        WrapMode::Clamp => c.clamp(0, size - 1) as usize,
    }
}

/// Blend applied when rasterising points into a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointBlend {
    Replace,
    Max,
    Add,
}

/// A typed grid of texels with one or two backing buffers
pub struct GridField<T: Texel> {
    descriptor: FieldDescriptor,
    width: u32,
    height: u32,
    /// Element count; smaller than `width * height` when a packed 1D field
    /// leaves its last row partly empty
    length: usize,
    buffers: Vec<Vec<T>>,
    front: usize,
    disposed: bool,
}

impl<T: Texel> GridField<T> {
    /// Allocate a zero-initialised 2D field
    pub fn allocate(descriptor: FieldDescriptor, width: u32, height: u32) -> Result<Self, GpuError> {
        descriptor.validate::<T>()?;
        let length = width as usize * height as usize;
        let buffers = allocate_buffers::<T>(&descriptor, width, height, length, None)?;

        log::debug!(
            "[GridField] Allocated '{}' {}x{} ({} comps, {:?}, {} buffers)",
            descriptor.name,
            width,
            height,
            T::COMPONENTS,
            descriptor.numeric_type,
            descriptor.buffer_count
        );

        Ok(Self {
            descriptor,
            width,
            height,
            length,
            buffers,
            front: 0,
            disposed: false,
        })
    }

    /// Allocate a 1D field of `len` elements, packed into rows when the
    /// descriptor caps the row width
    pub fn allocate_1d(descriptor: FieldDescriptor, len: u32) -> Result<Self, GpuError> {
        descriptor.validate::<T>()?;
        let (width, height) = descriptor.packed_size(len);
        let buffers = allocate_buffers::<T>(&descriptor, width, height, len as usize, None)?;

        log::debug!(
            "[GridField] Allocated 1D '{}' of {} packed as {}x{}",
            descriptor.name,
            len,
            width,
            height
        );

        Ok(Self {
            descriptor,
            width,
            height,
            length: len as usize,
            buffers,
            front: 0,
            disposed: false,
        })
    }

    /// Reallocate storage. The previous contents stay intact if allocation fails.
    pub fn resize(&mut self, width: u32, height: u32, initial: Option<&[T]>) -> Result<(), GpuError> {
        *self = self.reallocated(width, height, initial)?;
        Ok(())
    }

    /// A new field with this field's descriptor and fresh storage
    pub fn reallocated(&self, width: u32, height: u32, initial: Option<&[T]>) -> Result<Self, GpuError> {
        self.ensure_live()?;
        let length = width as usize * height as usize;
        let buffers = allocate_buffers(&self.descriptor, width, height, length, initial)?;

        Ok(Self {
            descriptor: self.descriptor.clone(),
            width,
            height,
            length,
            buffers,
            front: 0,
            disposed: false,
        })
    }

    /// A new 1D field of `len` elements with this field's descriptor
    pub fn reallocated_1d(&self, len: u32, initial: Option<&[T]>) -> Result<Self, GpuError> {
        self.ensure_live()?;
        let (width, height) = self.descriptor.packed_size(len);
        let buffers = allocate_buffers(&self.descriptor, width, height, len as usize, initial)?;

        Ok(Self {
            descriptor: self.descriptor.clone(),
            width,
            height,
            length: len as usize,
            buffers,
            front: 0,
            disposed: false,
        })
    }

    /// Release the backing storage. A second call is an error.
    pub fn dispose(&mut self) -> Result<(), GpuError> {
        self.ensure_live()?;
        self.buffers = Vec::new();
        self.disposed = true;
        log::debug!("[GridField] Disposed '{}'", self.descriptor.name);
        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Contents of the current read buffer; empty once disposed
    pub fn front(&self) -> &[T] {
        self.buffers.get(self.front).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sampler over the read buffer
    pub fn view(&self) -> Result<FieldView<'_, T>, GpuError> {
        self.ensure_live()?;
        Ok(FieldView {
            data: self.front(),
            width: self.width,
            height: self.height,
            wrap_x: self.descriptor.wrap_x,
            wrap_y: self.descriptor.wrap_y,
            filter: self.descriptor.filter,
        })
    }

    /// Overwrite the read buffer
    pub fn write(&mut self, data: &[T]) -> Result<(), GpuError> {
        self.ensure_live()?;
        if data.len() != self.len() {
            return Err(GpuError::SizeMismatch {
                name: self.descriptor.name,
                expected: self.len(),
                actual: data.len(),
            });
        }
        self.buffers[self.front].copy_from_slice(data);
        Ok(())
    }

    /// Fill the read buffer with one value
    pub fn fill(&mut self, value: T) -> Result<(), GpuError> {
        self.ensure_live()?;
        self.buffers[self.front].fill(value);
        Ok(())
    }

    /// Swap read/write roles. No-op for single-buffered fields.
    pub fn swap(&mut self) {
        if self.buffers.len() == 2 {
            self.front = 1 - self.front;
        }
    }

    /// Write every texel from `body(x, y)` and make the result readable.
    ///
    /// The body cannot borrow this field, so a single-buffered output is
    /// never read during its own dispatch.
    pub fn step<F>(&mut self, body: F) -> Result<(), GpuError>
    where
        F: Fn(u32, u32) -> T + Sync,
    {
        self.ensure_live()?;
        let width = self.width as usize;
        let target = if self.buffers.len() == 2 { 1 - self.front } else { self.front };

        dispatch_rows(&mut self.buffers[target], width, |x, y| body(x, y));
        self.swap();
        Ok(())
    }

    /// Read the front buffer and write the back buffer in one dispatch, then swap
    pub fn step_in_place<F>(&mut self, body: F) -> Result<(), GpuError>
    where
        F: Fn(&FieldView<'_, T>, u32, u32) -> T + Sync,
    {
        self.ensure_live()?;
        if self.buffers.len() != 2 {
            return Err(GpuError::SingleBuffered { name: self.descriptor.name });
        }

        let width = self.width;
        let height = self.height;
        let wrap_x = self.descriptor.wrap_x;
        let wrap_y = self.descriptor.wrap_y;
        let filter = self.descriptor.filter;

        let (first, second) = self.buffers.split_at_mut(1);
        let (front, back) = if self.front == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        };

        let view = FieldView {
            data: front,
            width,
            height,
            wrap_x,
            wrap_y,
            filter,
        };
        dispatch_rows(back, width as usize, |x, y| body(&view, x, y));

        self.swap();
        Ok(())
    }

    /// Rasterise points into the read buffer. Coordinates wrap or clamp per the descriptor.
    pub fn blend_points(&mut self, points: &[(i64, i64, T)], blend: PointBlend) -> Result<(), GpuError>
    where
        T: PartialOrd + std::ops::Add<Output = T>,
    {
        self.ensure_live()?;
        let width = self.width;
        let height = self.height;
        let wrap_x = self.descriptor.wrap_x;
        let wrap_y = self.descriptor.wrap_y;
        let buffer = &mut self.buffers[self.front];

        for &(x, y, value) in points {
            let x = wrap_coord(x, width, wrap_x);
            let y = wrap_coord(y, height, wrap_y);
            let texel = &mut buffer[y * width as usize + x];
            *texel = match blend {
                PointBlend::Replace => value,
                PointBlend::Max => {
                    if value > *texel { value } else { *texel }
                }
                PointBlend::Add => *texel + value,
            };
        }
        Ok(())
    }

    fn ensure_live(&self) -> Result<(), GpuError> {
        if self.disposed {
            Err(GpuError::Disposed { name: self.descriptor.name })
        } else {
            Ok(())
        }
    }
}

/// Row-parallel dispatch over every texel of `buffer`
fn dispatch_rows<T, F>(buffer: &mut [T], width: usize, body: F)
where
    T: Texel,
    F: Fn(u32, u32) -> T + Sync,
{
    if width == 0 {
        return;
    }
    buffer
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, texel) in row.iter_mut().enumerate() {
                *texel = body(x as u32, y as u32);
            }
        });
}

fn allocate_buffers<T: Texel>(
    descriptor: &FieldDescriptor,
    width: u32,
    height: u32,
    len: usize,
    initial: Option<&[T]>,
) -> Result<Vec<Vec<T>>, GpuError> {
    if width == 0 || height == 0 {
        return Err(GpuError::InvalidDimensions {
            name: descriptor.name,
            width,
            height,
        });
    }

    if let Some(data) = initial {
        if data.len() != len {
            return Err(GpuError::SizeMismatch {
                name: descriptor.name,
                expected: len,
                actual: data.len(),
            });
        }
    }

    let mut buffers = Vec::with_capacity(descriptor.buffer_count as usize);
    for _ in 0..descriptor.buffer_count {
        let mut buffer: Vec<T> = Vec::new();
        buffer.try_reserve_exact(len).map_err(|_| GpuError::OutOfMemory {
            name: descriptor.name,
            bytes: (len * std::mem::size_of::<T>()) as u64,
        })?;
        match initial {
            Some(data) => buffer.extend_from_slice(data),
            None => buffer.resize(len, T::default()),
        }
        buffers.push(buffer);
    }
    Ok(buffers)
}
