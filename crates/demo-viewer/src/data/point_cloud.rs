use episode::ColoredPoint;

/// Smallest instance buffer ever allocated, in points.
const MIN_CAPACITY: usize = 1024;

/// Capacity to allocate so that `needed` points fit. Grows to the next power
/// of two and never shrinks.
pub fn grown_capacity(current: usize, needed: usize) -> usize {
    if needed <= current {
        current
    } else {
        needed.max(MIN_CAPACITY).next_power_of_two()
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Point Instances"),
        size: (capacity * std::mem::size_of::<ColoredPoint>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Instance buffer holding the frame currently on screen. Every frame of a
/// sequence has the same point count, so the buffer is rewritten in place and
/// only reallocated when a larger sequence arrives.
#[derive(Debug)]
pub struct PointCloudGpu {
    pub vtx: wgpu::Buffer,
    capacity: usize,
    len: u32,
}

impl PointCloudGpu {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            vtx: create_instance_buffer(device, MIN_CAPACITY),
            capacity: MIN_CAPACITY,
            len: 0,
        }
    }

    /// Number of points drawn.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn write_frame(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, points: &[ColoredPoint]) {
        let capacity = grown_capacity(self.capacity, points.len());
        if capacity != self.capacity {
            log::debug!(
                "Growing point buffer: {} -> {} points",
                self.capacity,
                capacity
            );
            self.vtx.destroy();
            self.vtx = create_instance_buffer(device, capacity);
            self.capacity = capacity;
        }

        if !points.is_empty() {
            queue.write_buffer(&self.vtx, 0, bytemuck::cast_slice(points));
        }
        self.len = points.len() as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_grows_to_power_of_two() {
        assert_eq!(grown_capacity(1024, 10), 1024);
        assert_eq!(grown_capacity(1024, 1024), 1024);
        assert_eq!(grown_capacity(1024, 5000), 8192);
        assert_eq!(grown_capacity(8192, 5000), 8192);
        assert_eq!(grown_capacity(0, 3), MIN_CAPACITY);
    }
}
