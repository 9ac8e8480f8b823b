use crate::types::{BinaryMask, DistanceField};

/// Exact Euclidean distance transform.
///
/// Every foreground pixel gets the straight-line distance to the nearest
/// background pixel, background pixels get 0. Pixels outside the image do not
/// count as background. Squared distances are computed with the separable
/// lower-envelope method (one pass over columns, one over rows), so the result
/// is exact and pixels at equal integer squared distance get identical values.
///
/// A mask without any background pixel has no finite answer; it maps to the
/// uniform value `sqrt(w² + h²)`, larger than any real in-image distance.
pub fn euclidean_distance_transform(mask: &BinaryMask) -> DistanceField {
    let (width, height) = mask.dimensions();
    if width == 0 || height == 0 {
        return DistanceField::new(width, height, 0.0);
    }
    let (w, h) = (width as usize, height as usize);

    let unreachable = (w * w + h * h) as f64;
    let mut squared: Vec<f64> = mask
        .as_slice()
        .iter()
        .map(|&fg| if fg { unreachable } else { 0.0 })
        .collect();

    let n = w.max(h);
    let mut line = vec![0.0f64; n];
    let mut out = vec![0.0f64; n];
    let mut hull = vec![0usize; n];
    let mut bounds = vec![0.0f64; n + 1];

    for x in 0..w {
        for y in 0..h {
            line[y] = squared[y * w + x];
        }
        lower_envelope(&line[..h], &mut out[..h], &mut hull, &mut bounds);
        for y in 0..h {
            squared[y * w + x] = out[y].min(unreachable);
        }
    }

    for y in 0..h {
        let row = &mut squared[y * w..(y + 1) * w];
        line[..w].copy_from_slice(row);
        lower_envelope(&line[..w], &mut out[..w], &mut hull, &mut bounds);
        for (dst, &v) in row.iter_mut().zip(&out[..w]) {
            *dst = v.min(unreachable);
        }
    }

    DistanceField::from_fn(width, height, |x, y| {
        squared[y as usize * w + x as usize].sqrt() as f32
    })
}

/// One-dimensional squared distance transform of the sampled function `f`:
/// `d[q] = min_p (q - p)² + f[p]`, via the lower envelope of parabolas.
fn lower_envelope(f: &[f64], d: &mut [f64], hull: &mut [usize], bounds: &mut [f64]) {
    let n = f.len();
    if n == 0 {
        return;
    }

    let intersect = |q: usize, p: usize| -> f64 {
        let (qf, pf) = (q as f64, p as f64);
        ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * (qf - pf))
    };

    let mut k = 0usize;
    hull[0] = 0;
    bounds[0] = f64::NEG_INFINITY;
    bounds[1] = f64::INFINITY;

    for q in 1..n {
        let mut s = intersect(q, hull[k]);
        while s <= bounds[k] {
            k -= 1;
            s = intersect(q, hull[k]);
        }
        k += 1;
        hull[k] = q;
        bounds[k] = s;
        bounds[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, slot) in d.iter_mut().enumerate() {
        while bounds[k + 1] < q as f64 {
            k += 1;
        }
        let dq = q as f64 - hull[k] as f64;
        *slot = dq * dq + f[hull[k]];
    }
}
