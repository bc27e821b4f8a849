use dmgbus_core::{
    AddressSpace, ButtonLines, Cartridge, CartridgeLoadError, EmulatorConfig, InterruptType,
    MemoryError, MemoryLayout, RegionKind,
};

const JOYP: u32 = 0xFF00;
const DIV: u32 = 0xFF04;
const TIMA: u32 = 0xFF05;
const TMA: u32 = 0xFF06;
const TAC: u32 = 0xFF07;

fn new_address_space() -> AddressSpace {
    AddressSpace::new(MemoryLayout::dmg(), EmulatorConfig::default())
        .expect("default config should be valid")
}

#[test]
fn every_address_resolves_and_nothing_past_the_end_does() {
    let mut address_space = new_address_space();
    let layout = address_space.layout().clone();

    for address in 0..layout.total_size() as u32 {
        let resolved = layout.resolve(address).expect("address should resolve");
        let region = layout.region(resolved.kind).expect("resolved region should exist");
        assert!(region.contains(address), "{address:04X} not in {}", resolved.kind);
    }

    for address in [0x1_0000, 0x1_0001, 0xFFFF_FFFF] {
        let expected = MemoryError::OutOfRange {
            address,
            size: 0x1_0000,
        };
        assert_eq!(Err(expected.clone()), address_space.read(address));
        assert_eq!(Err(expected), address_space.write(address, 0x00));
    }
}

#[test]
fn divider_reads_zero_after_any_write() {
    let mut address_space = new_address_space();

    for value in 0..=u8::MAX {
        address_space.tick(4096);
        assert_ne!(0x00, address_space.read(DIV).unwrap());

        address_space.write(DIV, value).unwrap();
        assert_eq!(0x00, address_space.read(DIV).unwrap());
    }
}

#[test]
fn timer_increments_and_overflows() {
    for (clock_select, rate) in [(0x00, 1024), (0x01, 16), (0x02, 64), (0x03, 256)] {
        let mut address_space = new_address_space();
        address_space.write(TMA, 0x37).unwrap();
        address_space.write(TAC, 0x04 | clock_select).unwrap();

        // Split the period across several ticks the way a CPU loop would
        for _ in 0..rate / 4 {
            address_space.tick(4);
        }
        assert_eq!(0x01, address_space.read(TIMA).unwrap());

        address_space.write(TIMA, 0xFF).unwrap();
        address_space.tick(rate - 1);
        assert_eq!(0xFF, address_space.read(TIMA).unwrap());
        assert!(!address_space.timer_interrupt_requested());

        address_space.tick(1);
        assert_eq!(0x37, address_space.read(TIMA).unwrap());
        assert!(address_space.timer_interrupt_requested());
        assert!(address_space.interrupt_flags().get(InterruptType::Timer));
    }
}

#[test]
fn disabled_timer_leaves_counter_unchanged() {
    let mut address_space = new_address_space();
    address_space.write(TIMA, 0x80).unwrap();
    address_space.write(TAC, 0x01).unwrap();

    for cycles in [4, 8, 16, 1024, 70224, 1_000_000] {
        address_space.tick(cycles);
    }

    assert_eq!(0x80, address_space.read(TIMA).unwrap());
    assert!(!address_space.timer_interrupt_requested());
}

#[test]
fn input_matrix_multiplexing() {
    let mut address_space = new_address_space();
    address_space.set_button_lines(ButtonLines::new(0b1010, 0b1111));

    address_space.write(JOYP, 0x10).unwrap();
    assert_eq!(0xC0 | 0x10 | 0b1010, address_space.read(JOYP).unwrap());

    address_space.write(JOYP, 0x00).unwrap();
    assert_eq!(0x0F, address_space.read(JOYP).unwrap() & 0x0F);
}

#[test]
fn cartridge_title_round_trip() {
    let mut raw_data: Vec<u8> = (0..0x8000).map(|i| (i % 251) as u8).collect();
    let title = b"DMGBUS TEST ROM\x00";
    raw_data[0x134..0x144].copy_from_slice(title);

    let cartridge = Cartridge::new(raw_data.clone());
    let mut address_space = new_address_space();
    address_space.load_cartridge(&cartridge).unwrap();

    let read_back: Vec<u8> = (0x134..0x144)
        .map(|address| address_space.read(address).unwrap())
        .collect();
    assert_eq!(&title[..], &read_back[..]);
    assert_eq!(Some("DMGBUS TEST ROM".to_string()), cartridge.title());

    assert_eq!(Some(raw_data), address_space.region_snapshot(RegionKind::Cartridge));
}

#[test]
fn oversized_cartridge_fails_to_load() {
    let mut address_space = new_address_space();

    let err = address_space
        .load_cartridge(&Cartridge::new(vec![0x00; 0x8000 + 1]))
        .unwrap_err();
    assert!(matches!(err, CartridgeLoadError::CapacityExceeded { .. }));
}

#[test]
fn forbidden_write_reads_back_sentinel() {
    let mut address_space = new_address_space();

    address_space.write(0xE000, 0xFF).unwrap();
    assert_eq!(0x00, address_space.read(0xE000).unwrap());
}
