use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kura_crypto::{harden, Transaction, VkeyWitness, XPrv};

fn root() -> XPrv {
    XPrv::from_bip39_entropy(&[0x5a; 32], b"")
}

fn root_from_entropy_bench(c: &mut Criterion) {
    let entropy = [0x5au8; 32];

    c.bench_function("root_from_entropy", |b| {
        b.iter(|| XPrv::from_bip39_entropy(black_box(&entropy), b""))
    });
}

fn account_path_bench(c: &mut Criterion) {
    let key = root();
    let path = [harden(1852), harden(1815), harden(0), 0, 0];

    c.bench_function("derive_payment_path", |b| {
        b.iter(|| key.derive_path(black_box(&path)))
    });
}

fn extended_sign_bench(c: &mut Criterion) {
    let signer = root().derive(harden(0)).to_signing_key();
    let msg = [42u8; 128];

    c.bench_function("extended_sign_128B", |b| {
        b.iter(|| signer.sign(black_box(&msg)))
    });
}

fn extended_verify_bench(c: &mut Criterion) {
    let signer = root().derive(harden(0)).to_signing_key();
    let msg = [42u8; 128];
    let sig = signer.sign(&msg);
    let public = signer.public_key();

    c.bench_function("extended_verify_128B", |b| {
        b.iter(|| kura_crypto::verify(&public, black_box(&msg), &sig))
    });
}

fn blake2b_bench(c: &mut Criterion) {
    let data = vec![0xCDu8; 1024];

    c.bench_function("blake2b_256_1KB", |b| {
        b.iter(|| kura_crypto::blake2b_256(black_box(&data)))
    });
    c.bench_function("blake2b_224_32B", |b| {
        b.iter(|| kura_crypto::blake2b_224(black_box(&data[..32])))
    });
}

fn witness_bench(c: &mut Criterion) {
    // [{2: 170000}, {}, true, null]
    let raw = [
        0x84, 0xa1, 0x02, 0x1a, 0x00, 0x02, 0x98, 0x10, 0xa0, 0xf5, 0xf6,
    ];
    let signer = root().derive(harden(0)).to_signing_key();

    c.bench_function("parse_and_witness_tx", |b| {
        b.iter(|| {
            let tx = Transaction::from_bytes(black_box(&raw)).unwrap();
            let witness = VkeyWitness::create(&tx.hash(), &signer);
            tx.witness_set_with(&[witness]).unwrap()
        })
    });
}

criterion_group!(
    benches,
    root_from_entropy_bench,
    account_path_bench,
    extended_sign_bench,
    extended_verify_bench,
    blake2b_bench,
    witness_bench,
);
criterion_main!(benches);
