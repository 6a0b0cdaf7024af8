//! Vertex data and vertex-array objects

use crate::backend::{BufferTarget, GpuApi};
use crate::error::{GfxError, GfxResult};

/// Interleaving-free attribute stream: `vertex_size` floats per vertex
#[derive(Debug, Clone, PartialEq)]
pub struct VertexArray {
    data: Vec<f32>,
    vertex_size: u32,
}

impl VertexArray {
    /// Wrap `data` as a stream of `vertex_size`-component vertices
    pub fn new(data: Vec<f32>, vertex_size: u32) -> GfxResult<Self> {
        if vertex_size < 1 {
            return Err(GfxError::invalid_argument("vertex size is less than one"));
        }
        if data.len() % vertex_size as usize != 0 {
            return Err(GfxError::invalid_argument(format!(
                "{} floats cannot be split into vertices of size {}",
                data.len(),
                vertex_size
            )));
        }
        Ok(Self { data, vertex_size })
    }

    /// Raw component data
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Components per vertex
    pub fn vertex_size(&self) -> u32 {
        self.vertex_size
    }

    /// Number of complete vertices
    pub fn vertex_count(&self) -> usize {
        self.data.len() / self.vertex_size as usize
    }
}

/// GPU-side vertex-array object
///
/// Attribute `i` is fed from the `i`-th vertex array it was built from, and
/// drawing uses the index list as triangles.
#[derive(Debug, PartialEq, Eq)]
pub struct VertexArrayObject {
    vao: u32,
    buffers: Vec<u32>,
    attribute_count: u32,
    index_count: u32,
}

impl VertexArrayObject {
    pub(crate) fn create<G: GpuApi>(gpu: &mut G, arrays: &[VertexArray], indices: &[u32]) -> GfxResult<Self> {
        let min_vertices = arrays
            .iter()
            .map(VertexArray::vertex_count)
            .min()
            .ok_or_else(|| GfxError::invalid_argument("at least one vertex array is required"))?;
        if let Some(&index) = indices.iter().find(|&&index| index as usize >= min_vertices) {
            return Err(GfxError::invalid_argument(format!(
                "index {index} is out of bounds of the vertex arrays ({min_vertices} vertices)"
            )));
        }
        let attribute_count = u32::try_from(arrays.len())
            .map_err(|_| GfxError::invalid_argument("too many vertex arrays"))?;
        let index_count =
            u32::try_from(indices.len()).map_err(|_| GfxError::invalid_argument("too many indices"))?;

        let vao = gpu.gen_vertex_array();
        if vao == 0 {
            return Err(GfxError::NativeCallFailed("glGenVertexArrays returned no name".to_string()));
        }
        let mut object = Self {
            vao,
            buffers: Vec::with_capacity(arrays.len() + 1),
            attribute_count,
            index_count,
        };

        object.bind(gpu);
        for (index, array) in (0u32..).zip(arrays) {
            let buffer = object.gen_buffer(gpu)?;
            gpu.upload_buffer(BufferTarget::Array, buffer, bytemuck::cast_slice(array.data()));
            gpu.vertex_attrib_pointer(index, array.vertex_size());
        }
        let buffer = object.gen_buffer(gpu)?;
        gpu.upload_buffer(BufferTarget::ElementArray, buffer, bytemuck::cast_slice(indices));
        object.unbind(gpu);

        log::debug!(
            "Created vertex array object {} ({} attribute(s), {} indices)",
            vao,
            attribute_count,
            index_count
        );
        Ok(object)
    }

    fn gen_buffer<G: GpuApi>(&mut self, gpu: &mut G) -> GfxResult<u32> {
        let buffer = gpu.gen_buffer();
        if buffer == 0 {
            self.unbind(gpu);
            self.release(gpu);
            return Err(GfxError::NativeCallFailed("glGenBuffers returned no name".to_string()));
        }
        self.buffers.push(buffer);
        Ok(buffer)
    }

    /// Native vertex-array name
    pub fn native_handle(&self) -> u32 {
        self.vao
    }

    /// Number of vertex attributes
    pub fn attribute_count(&self) -> u32 {
        self.attribute_count
    }

    /// Number of indices drawn per call
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub(crate) fn bind<G: GpuApi>(&self, gpu: &mut G) {
        gpu.bind_vertex_array(self.vao);
    }

    pub(crate) fn unbind<G: GpuApi>(&self, gpu: &mut G) {
        gpu.bind_vertex_array(0);
    }

    pub(crate) fn enable<G: GpuApi>(&self, gpu: &mut G) {
        for index in 0..self.attribute_count {
            gpu.set_attrib_enabled(index, true);
        }
    }

    pub(crate) fn disable<G: GpuApi>(&self, gpu: &mut G) {
        for index in 0..self.attribute_count {
            gpu.set_attrib_enabled(index, false);
        }
    }

    pub(crate) fn draw<G: GpuApi>(&self, gpu: &mut G) {
        gpu.draw_indexed_triangles(self.index_count);
    }

    pub(crate) fn release<G: GpuApi>(&mut self, gpu: &mut G) {
        gpu.delete_vertex_array(self.vao);
        for buffer in self.buffers.drain(..) {
            gpu.delete_buffer(buffer);
        }
    }
}
