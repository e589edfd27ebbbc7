use std::collections::VecDeque;
use tracing::warn;

static SAMPLES_FOR_AVG: u32 = 1000;

pub(crate) struct RollingAverage {
    total: f64,
    samples: VecDeque<f64>,
    max_samples: u32,
}

impl RollingAverage {
    pub fn new(max_samples: u32) -> Self {
        Self {
            total: 0f64,
            samples: VecDeque::with_capacity(max_samples as usize),
            max_samples,
        }
    }

    pub fn clear(&mut self) {
        self.total = 0f64;
        self.samples.clear();
    }

    pub fn add_sample(&mut self, sample: f64) {
        self.total += sample;
        self.samples.push_back(sample);
        if self.samples.len() as u32 > self.max_samples {
            if let Some(oldest) = self.samples.pop_front() {
                self.total -= oldest;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn avg(&self) -> f64 {
        if self.samples.is_empty() {
            return 0f64;
        }
        self.total / self.samples.len() as f64
    }
}

/// Time between the first two timestamps, `period` is in nanoseconds per tick.
fn elapsed_micro_seconds(timestamps: &[u64], period: f32) -> Option<f64> {
    match timestamps {
        [start, end, ..] => Some(end.wrapping_sub(*start) as f64 * period as f64 / 1000.0),
        _ => None,
    }
}

/// Timestamp queries around the render pass.
pub(crate) struct GpuTimer {
    pub(crate) query_set: wgpu::QuerySet,
    pub(crate) resolve_buffer: wgpu::Buffer,
    pub(crate) result_buffer: wgpu::Buffer,
    render_times: RollingAverage,
}

impl GpuTimer {
    const QUERY_COUNT: u32 = 2;

    pub fn new(device: &wgpu::Device) -> Self {
        let query_set = device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("timestamp query set"),
            count: Self::QUERY_COUNT,
            ty: wgpu::QueryType::Timestamp,
        });

        let resolve_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("timestamp resolve buffer"),
            size: (Self::QUERY_COUNT * 8) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let result_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("timestamp result buffer"),
            size: resolve_buffer.size(),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self {
            query_set,
            resolve_buffer,
            result_buffer,
            render_times: RollingAverage::new(SAMPLES_FOR_AVG),
        }
    }

    pub fn reset(&mut self) {
        self.render_times.clear();
    }

    pub fn render_pass_timestamp_writes(&self) -> wgpu::RenderPassTimestampWrites<'_> {
        wgpu::RenderPassTimestampWrites {
            query_set: &self.query_set,
            beginning_of_pass_write_index: Some(0),
            end_of_pass_write_index: Some(1),
        }
    }

    pub fn resolve(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.resolve_query_set(&self.query_set, 0..Self::QUERY_COUNT, &self.resolve_buffer, 0);
        encoder.copy_buffer_to_buffer(
            &self.resolve_buffer,
            0,
            &self.result_buffer,
            0,
            self.result_buffer.size(),
        );
    }

    pub async fn collect_query_results(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let (sender, receiver) = tokio::sync::oneshot::channel();
        self.result_buffer
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |r| {
                let _ = sender.send(r);
            });
        device.poll(wgpu::Maintain::wait()).panic_on_timeout();

        match receiver.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(%err, "Unable to map timestamp results, skipping sample");
                return;
            }
            Err(_) => {
                warn!("Timestamp map callback was dropped, skipping sample");
                return;
            }
        }

        let timestamps: Vec<u64> = {
            let timestamp_view = self.result_buffer.slice(..).get_mapped_range();
            bytemuck::pod_collect_to_vec(&timestamp_view)
        };

        self.result_buffer.unmap();

        if let Some(sample) = elapsed_micro_seconds(&timestamps, queue.get_timestamp_period()) {
            self.render_times.add_sample(sample);
        }
    }

    pub fn frame_time_msg(&self) -> String {
        format!(
            "GPU: {:.2}μs avg over {} frames",
            self.render_times.avg(),
            self.render_times.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_average_is_zero() {
        let avg = RollingAverage::new(4);
        assert_relative_eq!(avg.avg(), 0.0);
    }

    #[test]
    fn average_drops_oldest_samples() {
        let mut avg = RollingAverage::new(3);
        avg.add_sample(10.0);
        avg.add_sample(20.0);
        avg.add_sample(30.0);
        assert_relative_eq!(avg.avg(), 20.0);

        avg.add_sample(60.0);
        assert_eq!(avg.len(), 3);
        assert_relative_eq!(avg.avg(), 110.0 / 3.0);

        avg.clear();
        assert_eq!(avg.len(), 0);
        assert_relative_eq!(avg.avg(), 0.0);
    }

    #[test]
    fn elapsed_time_needs_both_timestamps() {
        assert_eq!(elapsed_micro_seconds(&[], 1.0), None);
        assert_eq!(elapsed_micro_seconds(&[1_000], 1.0), None);
        assert_relative_eq!(
            elapsed_micro_seconds(&[1_000, 5_000], 2.0).unwrap_or_default(),
            8.0
        );
    }
}
