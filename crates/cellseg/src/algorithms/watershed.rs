//! Marker-controlled watershed over the negated distance field.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::{
    error::{Result, SegmentError},
    types::{BinaryMask, DistanceField, LabelMap, SeedMap},
};

/// Queue entry. Lower surface floods first. On equal surface the front that
/// took fewer steps from its seed goes first, then the lower seed id, then
/// insertion order.
#[derive(Debug, Clone, Copy)]
struct FloodItem {
    surface: f32,
    hops: u32,
    seed: u32,
    order: u64,
    index: usize,
}

impl PartialEq for FloodItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FloodItem {}

impl PartialOrd for FloodItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloodItem {
    // Reversed so that `BinaryHeap` pops the smallest key.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .surface
            .total_cmp(&self.surface)
            .then_with(|| other.hops.cmp(&self.hops))
            .then_with(|| other.seed.cmp(&self.seed))
            .then_with(|| other.order.cmp(&self.order))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unvisited,
    Queued,
    Done,
}

/// Flood `-distance` from the seed blobs, never leaving the mask.
///
/// A dequeued pixel whose labeled 8-neighbours all agree joins that region and
/// queues its own neighbours. One that touches two or more regions becomes a
/// boundary: it keeps label 0 and stops the flood there, so distinct regions
/// are never 8-adjacent. Seeds outside the mask are ignored.
pub fn watershed(seeds: &SeedMap, distance: &DistanceField, mask: &BinaryMask) -> Result<LabelMap> {
    let dims = mask.dimensions();
    for actual in [seeds.dimensions(), distance.dimensions()] {
        if actual != dims {
            return Err(SegmentError::DimensionMismatch { expected: dims, actual });
        }
    }

    let (width, height) = dims;
    let fg = mask.as_slice();
    let depth = distance.as_slice();
    let mut labels = LabelMap::new(width, height, 0);
    let mut state = vec![State::Unvisited; labels.len()];
    let mut heap = BinaryHeap::new();
    let mut order = 0u64;

    for (i, &seed) in seeds.as_slice().iter().enumerate() {
        if seed != 0 && fg[i] {
            labels.as_mut_slice()[i] = seed;
            state[i] = State::Done;
        }
    }

    for i in 0..labels.len() {
        let seed = labels.as_slice()[i];
        if seed == 0 {
            continue;
        }
        for n in seeds.neighbors8(i) {
            if fg[n] && state[n] == State::Unvisited {
                state[n] = State::Queued;
                heap.push(FloodItem { surface: -depth[n], hops: 1, seed, order, index: n });
                order += 1;
            }
        }
    }

    let mut boundary = 0usize;
    while let Some(item) = heap.pop() {
        let i = item.index;
        state[i] = State::Done;

        let mut region = 0u32;
        let mut contested = false;
        for n in seeds.neighbors8(i) {
            let l = labels.as_slice()[n];
            if l == 0 {
                continue;
            }
            if region == 0 {
                region = l;
            } else if l != region {
                contested = true;
                break;
            }
        }

        if contested || region == 0 {
            boundary += 1;
            continue;
        }

        labels.as_mut_slice()[i] = region;
        for n in seeds.neighbors8(i) {
            if fg[n] && state[n] == State::Unvisited {
                state[n] = State::Queued;
                heap.push(FloodItem {
                    surface: -depth[n],
                    hops: item.hops + 1,
                    seed: region,
                    order,
                    index: n,
                });
                order += 1;
            }
        }
    }

    debug!(boundary_pixels = boundary, regions = labels.max_label(), "watershed complete");
    Ok(labels)
}
