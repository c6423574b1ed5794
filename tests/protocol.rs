//! End-to-end protocol scenarios
//!
//! Full lifecycle runs over the simulation proof backend: mint coins,
//! accumulate their commitments, pour them to new owners, and verify from
//! the ledger observer's side — plus the supported-imbalance table and the
//! tamper laws for every public field of a pour.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use zerocash::commitment_tree::verify_witness;
use zerocash::crypto::proof::SimulationBackend;
use zerocash::{
    Address, Coin, IncrementalMerkleTree, MintTransaction, PourInput, PourOutput, PourParams,
    PourTransaction, ROOT_SIZE, SIG_PK_SIZE,
};

const TEST_TREE_DEPTH: usize = 4;
const PUBKEY_HASH: [u8; SIG_PK_SIZE] = [b'a'; SIG_PK_SIZE];

struct HappyPour {
    params: PourParams<SimulationBackend>,
    anchor: [u8; ROOT_SIZE],
    tx: PourTransaction,
    recipients: [Address; 2],
}

/// The canonical scenario: five coins of values 0..=4, commitments
/// accumulated in a depth-4 tree, coins 1 and 3 poured into two coins of
/// value 2 with no public value movement.
fn build_happy_pour(rng: &mut ChaCha20Rng) -> HappyPour {
    let params = PourParams::<SimulationBackend>::generate(TEST_TREE_DEPTH, rng).unwrap();

    let addresses: Vec<Address> = (0..5).map(|_| Address::random(rng)).collect();
    let coins: Vec<Coin> = addresses
        .iter()
        .enumerate()
        .map(|(value, address)| Coin::random(address.public_address(), value as u64, rng))
        .collect();

    let mut tree = IncrementalMerkleTree::new(TEST_TREE_DEPTH).unwrap();
    for coin in &coins {
        tree.insert(coin.commitment().to_bytes()).unwrap();
    }
    let anchor = tree.root();

    let witness_1 = tree.witness(1).unwrap();
    let witness_2 = tree.witness(3).unwrap();
    assert!(verify_witness(
        coins[1].commitment().as_bytes(),
        1,
        &witness_1,
        &anchor
    ));

    let recipients = [Address::random(rng), Address::random(rng)];
    let tx = PourTransaction::new(
        1,
        &params,
        anchor,
        [
            PourInput::new(coins[1].clone(), addresses[1].clone(), 1, witness_1),
            PourInput::new(coins[3].clone(), addresses[3].clone(), 3, witness_2),
        ],
        [
            PourOutput::to(recipients[0].public_address().clone(), 2, rng),
            PourOutput::to(recipients[1].public_address().clone(), 2, rng),
        ],
        0,
        0,
        &PUBKEY_HASH,
        rng,
    )
    .unwrap();

    HappyPour {
        params,
        anchor,
        tx,
        recipients,
    }
}

#[test]
fn mint_then_pour_then_verify() {
    let mut rng = ChaCha20Rng::seed_from_u64(7);

    // Mint survives a wire round-trip and verifies.
    let minter = Address::random(&mut rng);
    let minted = Coin::random(minter.public_address(), 4, &mut rng);
    let mint = MintTransaction::new(&minted);
    let mint = MintTransaction::from_bytes(&mint.to_bytes()).unwrap();
    assert!(mint.verify());
    assert_eq!(mint.public_value(), 4);

    let pour = build_happy_pour(&mut rng);
    assert!(pour.tx.verify(&pour.params, &PUBKEY_HASH, &pour.anchor));

    // Each recipient recovers exactly their coin from the ciphertexts.
    for (index, recipient) in pour.recipients.iter().enumerate() {
        let received = recipient.try_decrypt_coin(pour.tx.ciphertext(index)).unwrap();
        assert_eq!(received.value(), 2);
        assert_eq!(received.commitment(), &pour.tx.new_commitments()[index]);
    }

    // The other recipient's ciphertext stays opaque.
    assert!(pour.recipients[0]
        .try_decrypt_coin(pour.tx.ciphertext(1))
        .is_err());

    // The two serial numbers are distinct double-spend markers.
    assert_ne!(pour.tx.serial_numbers()[0], pour.tx.serial_numbers()[1]);
}

#[test]
fn value_imbalance_fails_verification() {
    let mut rng = ChaCha20Rng::seed_from_u64(8);
    let params = PourParams::<SimulationBackend>::generate(TEST_TREE_DEPTH, &mut rng).unwrap();

    // Same shape as the happy pour, but two units leak out publicly.
    assert!(!test_pour(&params, 0, 2, &[1, 3], &[2, 2], &mut rng));
}

#[test]
fn pour_survives_wire_roundtrip() {
    let mut rng = ChaCha20Rng::seed_from_u64(9);
    let pour = build_happy_pour(&mut rng);

    let restored = PourTransaction::from_bytes(&pour.tx.to_bytes()).unwrap();
    assert_eq!(restored, pour.tx);
    assert!(restored.verify(&pour.params, &PUBKEY_HASH, &pour.anchor));
}

#[test]
fn root_of_zero_leaves_is_the_empty_hash() {
    let mut tree = IncrementalMerkleTree::new(TEST_TREE_DEPTH).unwrap();
    tree.insert_batch(&[[0u8; 32], [0u8; 32]]).unwrap();
    assert_eq!(tree.root(), [0u8; 32]);
}

#[test]
fn pour_with_dummy_input_and_output() {
    let mut rng = ChaCha20Rng::seed_from_u64(10);
    let params = PourParams::<SimulationBackend>::generate(TEST_TREE_DEPTH, &mut rng).unwrap();

    // One real input, one real output; the other slot on each side is a
    // dummy synthesized during construction.
    assert!(test_pour(&params, 0, 0, &[1], &[1], &mut rng));
}

/// Build and verify a pour with the given public values and coin values,
/// collapsing construction failures into `false` like a rejected
/// transaction.
fn test_pour(
    params: &PourParams<SimulationBackend>,
    public_in_value: u64,
    public_out_value: u64,
    input_values: &[u64],
    output_values: &[u64],
    rng: &mut ChaCha20Rng,
) -> bool {
    let mut tree = IncrementalMerkleTree::new(TEST_TREE_DEPTH).unwrap();

    let mut staged = Vec::new();
    for &value in input_values {
        let address = Address::random(rng);
        let coin = Coin::random(address.public_address(), value, rng);
        let index = tree.insert(coin.commitment().to_bytes()).unwrap();
        staged.push((address, coin, index));
    }
    let anchor = tree.root();

    let mut inputs = Vec::new();
    for (address, coin, index) in staged {
        let path = tree.witness(index).unwrap();
        inputs.push(PourInput::new(coin, address, index, path));
    }

    let mut outputs = Vec::new();
    for &value in output_values {
        outputs.push(PourOutput::new(value, rng));
    }

    match PourTransaction::from_io(
        params,
        &PUBKEY_HASH,
        anchor,
        inputs,
        outputs,
        public_in_value,
        public_out_value,
        rng,
    ) {
        Ok(tx) => tx.verify(params, &PUBKEY_HASH, &anchor),
        Err(_) => false,
    }
}

#[test]
fn supported_imbalance_table() {
    let mut rng = ChaCha20Rng::seed_from_u64(11);
    let params = PourParams::<SimulationBackend>::generate(TEST_TREE_DEPTH, &mut rng).unwrap();

    // Balanced pours verify.
    assert!(test_pour(&params, 0, 0, &[1], &[1], &mut rng));
    assert!(test_pour(&params, 0, 0, &[2], &[1, 1], &mut rng));
    assert!(test_pour(&params, 0, 0, &[2, 2], &[3, 1], &mut rng));
    assert!(test_pour(&params, 0, 1, &[1], &[], &mut rng));
    assert!(test_pour(&params, 0, 1, &[2], &[1], &mut rng));
    assert!(test_pour(&params, 0, 1, &[2, 2], &[2, 1], &mut rng));
    assert!(test_pour(&params, 1, 0, &[], &[1], &mut rng));
    assert!(test_pour(&params, 1, 0, &[1], &[1, 1], &mut rng));
    assert!(test_pour(&params, 1, 0, &[2, 2], &[2, 3], &mut rng));

    // Imbalanced pours do not.
    assert!(!test_pour(&params, 0, 1, &[1], &[1], &mut rng));
    assert!(!test_pour(&params, 0, 1, &[2], &[1, 1], &mut rng));
    assert!(!test_pour(&params, 0, 1, &[2, 2], &[3, 1], &mut rng));
    assert!(!test_pour(&params, 0, 2, &[1], &[], &mut rng));
    assert!(!test_pour(&params, 0, 2, &[2], &[1], &mut rng));
    assert!(!test_pour(&params, 0, 2, &[2, 2], &[2, 1], &mut rng));
    assert!(!test_pour(&params, 1, 1, &[], &[1], &mut rng));
    assert!(!test_pour(&params, 1, 1, &[1], &[1, 1], &mut rng));
    assert!(!test_pour(&params, 1, 1, &[2, 2], &[2, 3], &mut rng));
    assert!(!test_pour(&params, 0, 0, &[2, 2], &[2, 3], &mut rng));

    // Conservation is checked in true 64-bit arithmetic: a sum that wraps
    // around to a matching value must still fail.
    assert!(test_pour(&params, 0, 0, &[u64::MAX], &[u64::MAX], &mut rng));
    assert!(!test_pour(&params, 0, 0, &[u64::MAX, 1], &[0], &mut rng));
}

#[test]
fn tampering_any_public_field_breaks_verification() {
    let mut rng = ChaCha20Rng::seed_from_u64(12);
    let pour = build_happy_pour(&mut rng);
    let bytes = pour.tx.to_bytes();

    // Every byte of the fixed-width public fields after the version word:
    // rt, sn_1, sn_2, cm_1, cm_2, v_pub_in, v_pub_out, mac_1, mac_2.
    let fixed_fields = 2 + 32 + 32 + 32 + 32 + 8 + 8 + 32 + 32;
    for offset in 2..fixed_fields {
        let mut tampered = bytes.clone();
        tampered[offset] ^= 0x01;
        let tx = PourTransaction::from_bytes(&tampered).unwrap();
        assert!(
            !tx.verify(&pour.params, &PUBKEY_HASH, &pour.anchor),
            "flipping byte {offset} went unnoticed"
        );
    }

    // And the proof blob, which sits at the end of the wire form.
    let mut tampered = bytes.clone();
    let last = tampered.len() - 1;
    tampered[last] ^= 0x01;
    let tx = PourTransaction::from_bytes(&tampered).unwrap();
    assert!(!tx.verify(&pour.params, &PUBKEY_HASH, &pour.anchor));
}

#[test]
fn pour_chains_into_the_accumulator() {
    // A pour's output commitment becomes spendable once inserted: pour
    // again from the received coin.
    let mut rng = ChaCha20Rng::seed_from_u64(13);
    let first = build_happy_pour(&mut rng);

    let mut tree = IncrementalMerkleTree::new(TEST_TREE_DEPTH).unwrap();
    let received = first.recipients[0]
        .try_decrypt_coin(first.tx.ciphertext(0))
        .unwrap();
    let index = tree.insert(received.commitment().to_bytes()).unwrap();
    let anchor = tree.root();
    let path = tree.witness(index).unwrap();

    let next_recipient = Address::random(&mut rng);
    let tx = PourTransaction::from_io(
        &first.params,
        &PUBKEY_HASH,
        anchor,
        vec![PourInput::new(
            received,
            first.recipients[0].clone(),
            index,
            path,
        )],
        vec![PourOutput::to(
            next_recipient.public_address().clone(),
            2,
            &mut rng,
        )],
        0,
        0,
        &mut rng,
    )
    .unwrap();
    assert!(tx.verify(&first.params, &PUBKEY_HASH, &anchor));
}
