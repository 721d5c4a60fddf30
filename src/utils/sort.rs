use core::mem;
use std::ops::AddAssign;

/// LSD radix sort of SoA (index, value) pairs by index.
/// - stable: equal indices keep their input order
/// - values are moved together with their index
///
/// Complexity: 4 passes, each O(n + 256)
pub fn radix_sort_u32_soa<N: Copy + Default>(inds: &mut [u32], vals: &mut [N]) {
    assert_eq!(inds.len(), vals.len());
    let n = inds.len();
    if n <= 1 {
        return;
    }

    // Small sizes: insertion sort beats allocating scratch.
    if n <= 32 {
        insertion_sort_u32_soa(inds, vals);
        return;
    }

    let mut inds_tmp = vec![0u32; n];
    let mut vals_tmp = vec![N::default(); n];

    let mut src_inds: &mut [u32] = inds;
    let mut src_vals: &mut [N] = vals;
    let mut dst_inds: &mut [u32] = &mut inds_tmp;
    let mut dst_vals: &mut [N] = &mut vals_tmp;

    for shift in [0u32, 8, 16, 24] {
        let mut count = [0usize; 256];
        for &k in src_inds.iter() {
            count[((k >> shift) & 0xFF) as usize] += 1;
        }

        // prefix sum -> starting positions
        let mut sum = 0usize;
        for c in count.iter_mut() {
            let tmp = *c;
            *c = sum;
            sum += tmp;
        }

        for idx in 0..n {
            let k = src_inds[idx];
            let b = ((k >> shift) & 0xFF) as usize;
            let pos = count[b];
            count[b] = pos + 1;
            dst_inds[pos] = k;
            dst_vals[pos] = src_vals[idx];
        }

        mem::swap(&mut src_inds, &mut dst_inds);
        mem::swap(&mut src_vals, &mut dst_vals);
    }
    // 4 passes (even): the result is back in the caller's slices.
}

#[inline]
fn insertion_sort_u32_soa<N: Copy>(inds: &mut [u32], vals: &mut [N]) {
    for i in 1..inds.len() {
        let mut j = i;
        while j > 0 && inds[j] < inds[j - 1] {
            inds.swap(j, j - 1);
            vals.swap(j, j - 1);
            j -= 1;
        }
    }
}

/// Sort (index, value) pairs by index and sum the values of equal indices.
/// Entries whose sum is zero are removed.
///
/// Used to turn hashed token buckets into a sparse row.
pub fn sort_coalesce_u32_soa<N>(inds: &mut Vec<u32>, vals: &mut Vec<N>)
where
    N: Copy + Default + PartialEq + AddAssign,
{
    radix_sort_u32_soa(inds, vals);
    let mut write = 0usize;
    for read in 0..inds.len() {
        if write > 0 && inds[write - 1] == inds[read] {
            let v = vals[read];
            vals[write - 1] += v;
        } else {
            inds[write] = inds[read];
            vals[write] = vals[read];
            write += 1;
        }
    }
    inds.truncate(write);
    vals.truncate(write);

    let zero = N::default();
    if vals.iter().any(|v| *v == zero) {
        let mut keep = 0usize;
        for i in 0..inds.len() {
            if vals[i] != zero {
                inds[keep] = inds[i];
                vals[keep] = vals[i];
                keep += 1;
            }
        }
        inds.truncate(keep);
        vals.truncate(keep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// stable baseline: sort by (key, original_index)
    fn baseline_stable_sort<N: Copy>(inds: &[u32], vals: &[N]) -> (Vec<u32>, Vec<N>) {
        let mut pairs: Vec<(u32, usize, N)> = inds
            .iter()
            .copied()
            .enumerate()
            .map(|(i, k)| (k, i, vals[i]))
            .collect();
        pairs.sort_unstable_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        pairs.into_iter().map(|(k, _, v)| (k, v)).unzip()
    }

    /// tiny deterministic PRNG (xorshift32)
    struct Rng(u32);
    impl Rng {
        fn next_u32(&mut self) -> u32 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            self.0 = x;
            x
        }
    }

    #[test]
    fn radix_sort_matches_baseline_many_sizes() {
        let mut rng = Rng(0x1234_5678);
        for &n in &[0usize, 1, 2, 31, 32, 33, 64, 129, 1024] {
            let mut inds = Vec::with_capacity(n);
            let mut vals = Vec::with_capacity(n);
            for i in 0..n {
                inds.push(rng.next_u32() & 0x00FF_FFFF);
                vals.push(i as u32);
            }
            let (base_k, base_v) = baseline_stable_sort(&inds, &vals);
            radix_sort_u32_soa(&mut inds, &mut vals);
            assert_eq!(inds, base_k, "keys mismatch at n={n}");
            assert_eq!(vals, base_v, "vals mismatch at n={n}");
        }
    }

    #[test]
    fn coalesce_sums_duplicate_buckets() {
        let mut inds = vec![9u32, 3, 9, 1, 3, 3];
        let mut vals = vec![1.0f64, 1.0, 1.0, 2.0, 1.0, -2.0];
        sort_coalesce_u32_soa(&mut inds, &mut vals);
        assert_eq!(inds, vec![1, 9]);
        assert_eq!(vals, vec![2.0, 2.0]);
    }

    #[test]
    fn coalesce_large_input_is_sorted_and_unique() {
        let mut rng = Rng(42);
        let mut inds: Vec<u32> = (0..500).map(|_| rng.next_u32() % 64).collect();
        let mut vals = vec![1u32; inds.len()];
        sort_coalesce_u32_soa(&mut inds, &mut vals);
        assert!(inds.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(vals.iter().sum::<u32>(), 500);
    }
}
