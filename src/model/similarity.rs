use super::vectorize::FeatureVector;

/// Square, symmetric matrix of pairwise cosine similarities, stored row-major.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f32>,
}

/// Cosine of two vectors with precomputed norms. A zero-magnitude side scores 0.
fn cosine(a: &FeatureVector, b: &FeatureVector, norm_a: f32, norm_b: f32) -> f32 {
    let denom = norm_a * norm_b;
    if denom == 0.0 {
        0.0
    } else {
        (a.dot(b) / denom).clamp(0.0, 1.0)
    }
}

/// Unwrap a worker's result, re-raising its panic on the calling thread.
fn rejoin<T>(result: std::thread::Result<T>) -> T {
    result.unwrap_or_else(|payload| std::panic::resume_unwind(payload))
}

impl SimilarityMatrix {
    /// Single-threaded pairwise pass.
    pub fn compute(vectors: &[FeatureVector]) -> Self {
        Self::compute_with_threads(vectors, 1)
    }

    /// Pairwise pass with the upper triangle split across up to `threads`
    /// workers. Each unordered pair is computed once and mirrored, so the result
    /// does not depend on the thread count.
    pub fn compute_with_threads(vectors: &[FeatureVector], threads: usize) -> Self {
        let n = vectors.len();
        let norms: Vec<f32> = vectors.iter().map(FeatureVector::norm).collect();

        // Row i holds similarities against columns i+1..n.
        let upper_row = |i: usize| -> Vec<f32> {
            ((i + 1)..n)
                .map(|j| cosine(&vectors[i], &vectors[j], norms[i], norms[j]))
                .collect()
        };

        let threads = threads.clamp(1, n.max(1));
        let rows: Vec<Vec<f32>> = if threads == 1 {
            (0..n).map(upper_row).collect()
        } else {
            // Interleave rows so the shrinking triangle spreads evenly.
            let mut per_worker: Vec<Vec<(usize, Vec<f32>)>> = std::thread::scope(|s| {
                let handles: Vec<_> = (0..threads)
                    .map(|w| {
                        let upper_row = &upper_row;
                        s.spawn(move || {
                            (w..n)
                                .step_by(threads)
                                .map(|i| (i, upper_row(i)))
                                .collect::<Vec<_>>()
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|h| rejoin(h.join()))
                    .collect()
            });
            let mut rows = vec![Vec::new(); n];
            for worker in per_worker.drain(..) {
                for (i, row) in worker {
                    rows[i] = row;
                }
            }
            rows
        };

        let mut values = vec![0.0f32; n * n];
        for (i, row) in rows.into_iter().enumerate() {
            values[i * n + i] = 1.0;
            for (offset, score) in row.into_iter().enumerate() {
                let j = i + 1 + offset;
                values[i * n + j] = score;
                values[j * n + i] = score;
            }
        }
        Self { size: n, values }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.values[i * self.size + j]
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.size..(i + 1) * self.size]
    }
}
