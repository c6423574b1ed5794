//! SHA-256 hashing and domain separation
//!
//! The protocol reuses SHA-256 for addresses, serial numbers, commitments,
//! Merkle nodes and MACs. Call sites are distinguished by small bit-level
//! tags that replace the low bits of one input, so every variant lives here
//! and nowhere else; the exact bit layouts are normative wire behavior and
//! must match the proof backend's statement.
//!
//! | derivation | input block (512 bits)                          |
//! | ---------- | ----------------------------------------------- |
//! | `a_pk`     | `a_sk` \|\| `00` \|\| 254 zero bits             |
//! | `sn`       | `a_sk` \|\| `01` \|\| `rho[0..254]`             |
//! | `mac_1`    | `a_sk` \|\| `100` \|\| `h_sig[0..253]`          |
//! | `mac_2`    | `a_sk` \|\| `101` \|\| `h_sig[0..253]`          |
//! | `k`        | `a_pk` \|\| `rho`                               |
//! | `cm`       | `k` \|\| 192 zero bits \|\| `v` (big-endian)    |

use sha2::{Digest, Sha256};

use crate::bits::{bits_to_bytes, bytes_to_bits};
use crate::{A_PK_SIZE, A_SK_SIZE, CM_SIZE, H_SIZE, RHO_SIZE, SIG_PK_SIZE, SN_SIZE, V_SIZE};

/// Zero padding between the inner commitment and the value in the outer
/// commitment block: 32 + 24 + 8 bytes make one 512-bit compression.
const CM_PAD_SIZE: usize = 64 - CM_SIZE - V_SIZE;

/// The collision-resistant hash: plain SHA-256.
pub fn crh(data: &[u8]) -> [u8; H_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Public address secret `a_pk` from the private address secret.
///
/// The second block is all zeros, which doubles as the `00` domain tag.
pub fn prf_addr(a_sk: &[u8; A_SK_SIZE]) -> [u8; A_PK_SIZE] {
    let mut block = [0u8; A_SK_SIZE + A_PK_SIZE];
    block[..A_SK_SIZE].copy_from_slice(a_sk);
    crh(&block)
}

/// Serial number of a coin: the unlinkable nullifier revealed on spend.
///
/// The seed loses its two low bits to the `01` tag; the spending secret is
/// hashed unmodified.
pub fn prf_sn(a_sk: &[u8; A_SK_SIZE], rho: &[u8; RHO_SIZE]) -> [u8; SN_SIZE] {
    let mut input = bytes_to_bits(a_sk);
    input.push(false);
    input.push(true);
    input.extend_from_slice(&bytes_to_bits(rho)[..RHO_SIZE * 8 - 2]);
    crh(&bits_to_bytes(&input))
}

/// Non-malleability MAC binding a pour to the enclosing signature key.
///
/// `which` selects the tag: `100` for the first MAC of a pour, `101` for the
/// second. The two slots MUST stay distinct or the proof statement breaks.
pub fn prf_mac(which: usize, a_sk: &[u8; A_SK_SIZE], h_sig: &[u8; H_SIZE]) -> [u8; H_SIZE] {
    debug_assert!(which < 2, "a pour carries exactly two MACs");
    let mut input = bytes_to_bits(a_sk);
    input.push(true);
    input.push(false);
    input.push(which == 1);
    input.extend_from_slice(&bytes_to_bits(h_sig)[..H_SIZE * 8 - 3]);
    crh(&bits_to_bytes(&input))
}

/// Inner commitment layer `k`, revealed by mint transactions.
pub fn commitment_inner(a_pk: &[u8; A_PK_SIZE], rho: &[u8; RHO_SIZE]) -> [u8; H_SIZE] {
    let mut block = [0u8; A_PK_SIZE + RHO_SIZE];
    block[..A_PK_SIZE].copy_from_slice(a_pk);
    block[A_PK_SIZE..].copy_from_slice(rho);
    crh(&block)
}

/// Outer commitment layer: the coin commitment published on the ledger.
///
/// The layout `k || pad || v` is shared verbatim by minting, pour
/// construction and verification.
pub fn commitment_outer(k: &[u8; H_SIZE], value: u64) -> [u8; CM_SIZE] {
    let mut block = [0u8; 64];
    block[..H_SIZE].copy_from_slice(k);
    block[H_SIZE + CM_PAD_SIZE..].copy_from_slice(&value.to_be_bytes());
    crh(&block)
}

/// Digest of the enclosing signature verifying key, `h_sig`.
pub fn signature_key_digest(pubkey_hash: &[u8; SIG_PK_SIZE]) -> [u8; H_SIZE] {
    crh(pubkey_hash)
}

/// The all-zero value standing in for every empty subtree.
pub const EMPTY_NODE: [u8; H_SIZE] = [0u8; H_SIZE];

/// Interior Merkle node hash.
///
/// Two all-zero children hash to the all-zero node, so the empty-subtree
/// hash is the zero value at every depth; a subtree with any content is
/// hashed normally.
pub fn merkle_node_hash(left: &[u8; H_SIZE], right: &[u8; H_SIZE]) -> [u8; H_SIZE] {
    if left == &EMPTY_NODE && right == &EMPTY_NODE {
        return EMPTY_NODE;
    }
    let mut block = [0u8; 64];
    block[..H_SIZE].copy_from_slice(left);
    block[H_SIZE..].copy_from_slice(right);
    crh(&block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prf_determinism() {
        let a_sk = [7u8; A_SK_SIZE];
        let rho = [9u8; RHO_SIZE];

        assert_eq!(prf_addr(&a_sk), prf_addr(&a_sk));
        assert_eq!(prf_sn(&a_sk, &rho), prf_sn(&a_sk, &rho));
    }

    #[test]
    fn test_domain_tags_distinct() {
        // The same key material must never collide across call sites.
        let a_sk = [1u8; A_SK_SIZE];
        let zeros = [0u8; 32];

        let a_pk = prf_addr(&a_sk);
        let sn = prf_sn(&a_sk, &zeros);
        let mac_1 = prf_mac(0, &a_sk, &zeros);
        let mac_2 = prf_mac(1, &a_sk, &zeros);

        assert_ne!(a_pk, sn);
        assert_ne!(mac_1, mac_2);
        assert_ne!(sn, mac_1);
        assert_ne!(sn, mac_2);
    }

    #[test]
    fn test_sn_ignores_low_seed_bits() {
        // The tag replaces the two low bits of rho after the truncation
        // shifts everything right, so seeds differing only in their last
        // two bits share a serial preimage.
        let a_sk = [3u8; A_SK_SIZE];
        let mut rho = [5u8; RHO_SIZE];
        let sn = prf_sn(&a_sk, &rho);
        rho[RHO_SIZE - 1] ^= 0b11;
        assert_eq!(prf_sn(&a_sk, &rho), sn);
        rho[RHO_SIZE - 1] ^= 0b100;
        assert_ne!(prf_sn(&a_sk, &rho), sn);
    }

    #[test]
    fn test_commitment_block_layout() {
        let k = [0xabu8; H_SIZE];
        let cm = commitment_outer(&k, 0x0102_0304_0506_0708);

        let mut block = [0u8; 64];
        block[..32].copy_from_slice(&k);
        block[56..].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(cm, crh(&block));
    }

    #[test]
    fn test_empty_node_convention() {
        assert_eq!(merkle_node_hash(&EMPTY_NODE, &EMPTY_NODE), EMPTY_NODE);

        let leaf = [1u8; H_SIZE];
        assert_ne!(merkle_node_hash(&leaf, &EMPTY_NODE), EMPTY_NODE);
        assert_ne!(
            merkle_node_hash(&leaf, &EMPTY_NODE),
            merkle_node_hash(&EMPTY_NODE, &leaf)
        );
    }
}
