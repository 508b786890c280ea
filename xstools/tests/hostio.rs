use proptest::prelude::*;
use rand::{
    Rng,
    SeedableRng,
};
use rand_chacha::ChaCha8Rng;
use xstools::{
    device::{
        mock::{
            Counter,
            Loopback,
            Mock,
        },
        Error as DeviceError,
        Kind,
    },
    hostio::Error,
    prelude::*,
};

#[test]
fn register_scalar_round_trip() {
    let board = Mock::new(0).with_memory(1, 0, 8);
    let mut reg = Mem::open(&board, 0, 1).unwrap();
    assert_eq!(reg.data_width(), 8);
    reg.write(0, 200).unwrap();
    assert_eq!(reg.read(0).unwrap(), 200);
}

#[test]
fn counter_wraps_after_sixteen_increments() {
    let board = Mock::new(0).with_circuit(3, Counter::new(4));
    let mut cntr = Dut::open(&board, 0, 3).unwrap();
    assert_eq!(cntr.num_inputs(), 1);
    assert_eq!(cntr.num_outputs(), 4);
    assert_eq!(cntr.read_value().unwrap(), 0);
    let counts: Vec<u64> = (0..16)
        .map(|_| {
            cntr.write(1).unwrap();
            cntr.read_value().unwrap()
        })
        .collect();
    let expected: Vec<u64> = (1..16).chain([0]).collect();
    assert_eq!(counts, expected);
}

#[test]
fn full_bram_round_trip() {
    let board = Mock::new(0).with_memory(2, 10, 16);
    let mut bram = Mem::open(&board, 0, 2).unwrap();
    assert_eq!(bram.size(), 1024);
    let mut rng = ChaCha8Rng::seed_from_u64(0xB8A3);
    let written: Vec<u64> = (0..bram.size())
        .map(|_| rng.gen_range(0..=bram.max_value()))
        .collect();
    bram.write_all(0, &written).unwrap();
    let mut read = vec![0u64; bram.size()];
    bram.read_into(0, &mut read).unwrap();
    let errors = written.iter().zip(&read).filter(|(w, r)| w != r).count();
    assert_eq!(errors, 0);
}

#[test]
fn unavailable_module_is_an_error() {
    let board = Mock::hostio_test(0);
    let err = Mem::open(&board, 0, 9).unwrap_err();
    assert!(matches!(
        err,
        Error::Device(DeviceError::DeviceUnavailable {
            kind: Kind::Memory,
            usb: 0,
            module: 9
        })
    ));
    assert_eq!(
        err.to_string(),
        "Memory module 9 is not available on USB port 0"
    );
}

#[test]
fn reads_do_not_advance_state() {
    let board = Mock::new(0).with_circuit(3, Counter::new(4));
    let mut cntr = Dut::open(&board, 0, 3).unwrap();
    cntr.write(1).unwrap();
    cntr.write(1).unwrap();
    let value = cntr.read_value().unwrap();
    let mut lines = [0u8; 4];
    let again = cntr.read_into(&mut lines).unwrap();
    assert_eq!(value, 2);
    assert_eq!(again, value);
    assert_eq!(Bits::from_lines(lines.to_vec()).value(), value);
}

proptest! {
    #[test]
    fn word_round_trip(width in 1u32..=64, addr in 0usize..16, seed: u64) {
        let board = Mock::new(0).with_memory(2, 4, width);
        let mut mem = Mem::open(&board, 0, 2).unwrap();
        let value = seed & mem.max_value();
        mem.write(addr, value).unwrap();
        prop_assert_eq!(mem.read(addr).unwrap(), value);
    }

    #[test]
    fn sequence_round_trip(words in prop::collection::vec(any::<u32>(), 1..=64), start in 0usize..64) {
        let board = Mock::new(0).with_memory(2, 7, 32);
        let mut mem = Mem::open(&board, 0, 2).unwrap();
        let words: Vec<u64> = words.into_iter().map(u64::from).collect();
        mem.write_all(start, &words).unwrap();
        prop_assert_eq!(mem.read_n(start, words.len()).unwrap(), words);
    }

    #[test]
    fn dut_write_packs_modulo_inputs(width in 1usize..=64, value: u64) {
        let board = Mock::new(0).with_circuit(5, Loopback::new(width));
        let mut dut = Dut::open(&board, 0, 5).unwrap();
        dut.write(value).unwrap();
        let mut lines = vec![0u8; width];
        dut.read_into(&mut lines).unwrap();
        let modulus_mask = if width == 64 { u64::MAX } else { (1u64 << width) - 1 };
        prop_assert_eq!(Bits::from_lines(lines).value(), value & modulus_mask);
    }
}
