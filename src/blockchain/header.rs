// chainindex_node_rust/src/blockchain/header.rs

use byteorder::{LittleEndian, WriteBytesExt};
use sha2::{Digest, Sha256};
use std::io::Write;

/// Header fields carried through the index. Only `prev_block_hash` and `bits`
/// are interpreted; the rest is passed to presentation untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeaderData {
    pub version: i32,
    pub prev_block_hash: [u8; 32],
    pub merkle_root: [u8; 32],
    /// Reserved field of Zcash-family headers; zero before Sapling.
    pub final_sapling_root: [u8; 32],
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: [u8; 32],
    pub solution: Vec<u8>,
}

impl BlockHeaderData {
    pub fn is_genesis(&self) -> bool {
        self.prev_block_hash == [0u8; 32]
    }

    /// Serialized header bytes in consensus field order.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(140 + 3 + self.solution.len());
        // Writes into a Vec cannot fail.
        let _ = self.encode_into(&mut buf);
        buf
    }

    fn encode_into<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_i32::<LittleEndian>(self.version)?;
        w.write_all(&self.prev_block_hash)?;
        w.write_all(&self.merkle_root)?;
        w.write_all(&self.final_sapling_root)?;
        w.write_u32::<LittleEndian>(self.timestamp)?;
        w.write_u32::<LittleEndian>(self.bits)?;
        w.write_all(&self.nonce)?;
        write_compact_size(w, self.solution.len() as u64)?;
        w.write_all(&self.solution)?;
        Ok(())
    }

    /// Double SHA-256 of the encoded header.
    pub fn get_hash(&self) -> [u8; 32] {
        let h1 = Sha256::digest(self.encode());
        let h2 = Sha256::digest(h1);
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&h2);
        hash
    }
}

fn write_compact_size<W: Write>(w: &mut W, n: u64) -> std::io::Result<()> {
    match n {
        0..=0xfc => w.write_u8(n as u8),
        0xfd..=0xffff => {
            w.write_u8(0xfd)?;
            w.write_u16::<LittleEndian>(n as u16)
        }
        0x1_0000..=0xffff_ffff => {
            w.write_u8(0xfe)?;
            w.write_u32::<LittleEndian>(n as u32)
        }
        _ => {
            w.write_u8(0xff)?;
            w.write_u64::<LittleEndian>(n)
        }
    }
}
