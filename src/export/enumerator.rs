//! Enumeration of every allocated voxel in a distance field.

use crate::error::{ExportError, Result};
use crate::map::DistanceField;
use crate::types::{BlockIndex, SdfSample};

/// Lazily yields every voxel of every allocated block.
///
/// Blocks are visited in the field's own order, voxels by linear index. No
/// voxel is skipped, whatever its weight. After the first `Err` the iterator
/// is exhausted.
pub struct VoxelEnumerator<'a> {
    field: &'a dyn DistanceField,
    blocks: Vec<BlockIndex>,
    voxels_per_block: usize,
    block_cursor: usize,
    voxel_cursor: usize,
    yielded: usize,
    failed: bool,
}

impl<'a> VoxelEnumerator<'a> {
    /// Snapshot the block list and check it against the allocation count.
    pub fn new(field: &'a dyn DistanceField) -> Result<Self> {
        let num_blocks = field.num_allocated_blocks();
        let blocks = field.allocated_blocks();
        if blocks.len() != num_blocks {
            return Err(ExportError::Integrity(format!(
                "map reports {} allocated blocks but lists {}",
                num_blocks,
                blocks.len()
            )));
        }
        Ok(Self {
            field,
            blocks,
            voxels_per_block: field.voxels_per_block(),
            block_cursor: 0,
            voxel_cursor: 0,
            yielded: 0,
            failed: false,
        })
    }

    /// Total number of samples this enumerator yields on success.
    pub fn total(&self) -> usize {
        self.blocks.len() * self.voxels_per_block
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Number of samples yielded so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }
}

impl<'a> Iterator for VoxelEnumerator<'a> {
    type Item = Result<SdfSample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.voxels_per_block == 0 {
            return None;
        }
        let block = *self.blocks.get(self.block_cursor)?;
        let linear_index = self.voxel_cursor;

        self.voxel_cursor += 1;
        if self.voxel_cursor == self.voxels_per_block {
            self.voxel_cursor = 0;
            self.block_cursor += 1;
        }

        match self.field.sample_at(block, linear_index) {
            Some(sample) => {
                self.yielded += 1;
                Some(Ok(sample))
            }
            None => {
                self.failed = true;
                Some(Err(ExportError::Integrity(format!(
                    "voxel {} of block {:?} is missing",
                    linear_index, block
                ))))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = self.total() - self.yielded;
        (0, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{TsdfMap, TsdfMapConfig};
    use glam::Vec3;

    fn map_with_blocks(indices: &[BlockIndex]) -> TsdfMap {
        let mut map = TsdfMap::new(TsdfMapConfig {
            voxel_size: 0.5,
            voxels_per_side: 2,
        })
        .unwrap();
        for &index in indices {
            map.fill_block(index, 1.0, |p| p.x);
        }
        map
    }

    #[test]
    fn test_yields_every_voxel_in_order() {
        let map = map_with_blocks(&[BlockIndex::new(1, 0, 0), BlockIndex::new(0, 0, 0)]);
        let enumerator = VoxelEnumerator::new(&map).unwrap();
        assert_eq!(enumerator.total(), 16);

        let samples: Vec<SdfSample> = enumerator.map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 16);
        // block (0,0,0) first, then linear order inside it
        assert_eq!(samples[0].position, Vec3::new(0.25, 0.25, 0.25));
        assert_eq!(samples[1].position, Vec3::new(0.75, 0.25, 0.25));
        assert_eq!(samples[8].position, Vec3::new(1.25, 0.25, 0.25));
    }

    #[test]
    fn test_empty_map_yields_nothing() {
        let map = map_with_blocks(&[]);
        let mut enumerator = VoxelEnumerator::new(&map).unwrap();
        assert_eq!(enumerator.total(), 0);
        assert!(enumerator.next().is_none());
    }

    struct OverReportingField {
        inner: TsdfMap,
    }

    impl DistanceField for OverReportingField {
        fn num_allocated_blocks(&self) -> usize {
            self.inner.num_allocated_blocks() + 1
        }
        fn voxels_per_block(&self) -> usize {
            self.inner.voxels_per_block()
        }
        fn allocated_blocks(&self) -> Vec<BlockIndex> {
            self.inner.allocated_blocks()
        }
        fn sample_at(&self, block: BlockIndex, linear_index: usize) -> Option<SdfSample> {
            self.inner.sample_at(block, linear_index)
        }
    }

    struct DanglingBlockField {
        inner: TsdfMap,
    }

    impl DistanceField for DanglingBlockField {
        fn num_allocated_blocks(&self) -> usize {
            2
        }
        fn voxels_per_block(&self) -> usize {
            self.inner.voxels_per_block()
        }
        fn allocated_blocks(&self) -> Vec<BlockIndex> {
            vec![BlockIndex::new(0, 0, 0), BlockIndex::new(9, 9, 9)]
        }
        fn sample_at(&self, block: BlockIndex, linear_index: usize) -> Option<SdfSample> {
            self.inner.sample_at(block, linear_index)
        }
    }

    #[test]
    fn test_count_mismatch_is_integrity_fault() {
        let field = OverReportingField {
            inner: map_with_blocks(&[BlockIndex::new(0, 0, 0)]),
        };
        assert!(matches!(
            VoxelEnumerator::new(&field),
            Err(ExportError::Integrity(_))
        ));
    }

    #[test]
    fn test_missing_block_fails_once() {
        let field = DanglingBlockField {
            inner: map_with_blocks(&[BlockIndex::new(0, 0, 0)]),
        };
        let mut enumerator = VoxelEnumerator::new(&field).unwrap();
        for _ in 0..8 {
            assert!(enumerator.next().unwrap().is_ok());
        }
        assert!(matches!(enumerator.next(), Some(Err(ExportError::Integrity(_)))));
        assert!(enumerator.next().is_none());
        assert_eq!(enumerator.yielded(), 8);
    }
}
