#[cfg(feature = "hprof")]
use coarse_prof::profile;
use log::info;
use pvs::{Region, VisibilityMatrix, VisibilityStore};
use std::io::{Read, Write};
use std::path::Path;

use crate::{BspError, BspTree};

const PVS_MAGIC: &[u8; 4] = b"PVS2";
/// Magic plus the two u64 counts
const HEADER_LEN: u64 = 4 + 8 + 8;

/// Leaf to leaf visibility, in the same bit layout as the region matrix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafPvs {
    matrix: VisibilityMatrix,
}

impl LeafPvs {
    /// A PVS in which no leaf sees anything
    pub fn new(leaf_count: usize) -> Self {
        Self {
            matrix: VisibilityMatrix::new(leaf_count),
        }
    }

    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.matrix.region_count()
    }

    #[inline]
    pub fn can_see(&self, from: usize, to: usize) -> bool {
        self.matrix.is_visible(from, to)
    }

    #[inline]
    pub fn words(&self) -> &[u32] {
        self.matrix.words()
    }

    pub fn size_in_bytes(&self) -> usize {
        self.words().len() * std::mem::size_of::<u32>()
    }

    /// Sum of all bytes of all words
    pub fn checksum(&self) -> u64 {
        self.words()
            .iter()
            .flat_map(|word| word.to_le_bytes())
            .map(u64::from)
            .sum()
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), BspError> {
        #[cfg(feature = "hprof")]
        profile!("leaf_pvs_save_to_file");
        let mut file = std::fs::File::create(path)?;

        file.write_all(PVS_MAGIC)?;
        file.write_all(&(self.leaf_count() as u64).to_le_bytes())?;
        file.write_all(&(self.words().len() as u64).to_le_bytes())?;

        let data_bytes: Vec<u8> = self
            .words()
            .iter()
            .flat_map(|&word| word.to_le_bytes())
            .collect();
        file.write_all(&data_bytes)?;

        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, BspError> {
        #[cfg(feature = "hprof")]
        profile!("leaf_pvs_load_from_file");
        let mut file = std::fs::File::open(path)?;

        let mut header = [0u8; 4];
        file.read_exact(&mut header)?;
        if &header != PVS_MAGIC {
            return Err(BspError::InvalidFormat);
        }

        let mut size_buffer = [0u8; 8];
        file.read_exact(&mut size_buffer)?;
        let leaf_count =
            usize::try_from(u64::from_le_bytes(size_buffer)).map_err(|_| BspError::InvalidFormat)?;
        file.read_exact(&mut size_buffer)?;
        let word_count =
            usize::try_from(u64::from_le_bytes(size_buffer)).map_err(|_| BspError::InvalidFormat)?;

        let expected = leaf_count
            .checked_mul(leaf_count)
            .ok_or(BspError::InvalidFormat)?
            .div_ceil(32);
        if word_count != expected {
            return Err(BspError::SizeMismatch {
                leaves: leaf_count,
                words: word_count,
                expected,
            });
        }

        let found = file.metadata()?.len();
        let expected = (word_count as u64)
            .checked_mul(4)
            .and_then(|n| n.checked_add(HEADER_LEN))
            .ok_or(BspError::InvalidFormat)?;
        if found != expected {
            return Err(BspError::Truncated { expected, found });
        }

        let mut data_bytes = vec![0u8; word_count * 4];
        file.read_exact(&mut data_bytes)?;
        let data: Vec<u32> = data_bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        let matrix =
            VisibilityMatrix::from_words(leaf_count, data).ok_or(BspError::InvalidFormat)?;
        Ok(Self { matrix })
    }
}

/// Expands the region visibility to the leaves of `tree`. Two regions that
/// see each other both ways make every inner leaf of one see every inner
/// leaf of the other. Solid leaves see nothing.
pub fn store_pvs<M: VisibilityStore>(tree: &BspTree, regions: &[Region], matrix: &M) -> LeafPvs {
    #[cfg(feature = "hprof")]
    profile!("store_pvs");
    let mut pvs = LeafPvs::new(tree.leaves().len());

    for (nr1, region1) in regions.iter().enumerate() {
        for (nr2, region2) in regions.iter().enumerate() {
            if !matrix.is_visible(nr1, nr2) || !matrix.is_visible(nr2, nr1) {
                continue;
            }

            for &leaf1 in &region1.leaves {
                if !tree.leaf(leaf1).is_inner {
                    continue;
                }
                for &leaf2 in &region2.leaves {
                    if tree.leaf(leaf2).is_inner {
                        pvs.matrix.flag_visible(leaf1, leaf2);
                    }
                }
            }
        }
    }

    info!("Size (bytes)        : {:10}", pvs.size_in_bytes());
    info!("CheckSum            : {:10}", pvs.checksum());
    pvs
}
