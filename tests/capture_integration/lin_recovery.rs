//! End-to-end LIN recovery: scripted serial line -> Sniffer -> capture records

use bus_sniffer::lin::{LengthTable, checksum};
use bus_sniffer::{Bus, CaptureRecord, MonitorTarget, Result, SnifferConfig};

use super::{FakeLinMaster, Line, TestSniffer, play, sniffer};

fn lin_config(lengths: LengthTable) -> SnifferConfig {
    SnifferConfig::default()
        .with_monitor(MonitorTarget::ByteStream)
        .with_lengths(lengths)
}

fn run<'a>(
    line: &'a Line,
    config: SnifferConfig,
    master: &FakeLinMaster,
) -> Result<TestSniffer<'a>> {
    let mut sniffer = sniffer(line, config);
    sniffer.start();
    play(&mut sniffer, line, master);
    sniffer.stop();
    Ok(sniffer)
}

fn records(sniffer: &TestSniffer<'_>) -> Result<Vec<CaptureRecord>> {
    Ok(sniffer.session().records()?.cloned().collect())
}

#[test]
fn break_sync_identifier_data_checksum() -> Result<()> {
    let line = Line::new();
    let mut master = FakeLinMaster::starting_at(1_000);
    master.frame(0xB1, &[0x0C, 0x00], 0x42);

    let sniffer = run(&line, lin_config(LengthTable::from_pairs([(0x31, 2)])?), &master)?;
    let records = records(&sniffer)?;

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.bus, Bus::Lin);
    assert_eq!(record.identifier, 0x31);
    assert_eq!(record.payload.as_slice(), &[0x0C, 0x00]);
    assert!(record.integrity_valid);
    assert_eq!(record.timestamp_us, 1_000);

    // 0x42 is the identifier-included sum; the data-only sum would be 0xF3.
    let detail = record.checksum.expect("LIN records carry checksum detail");
    assert_eq!(detail.protected_id, 0xB1);
    assert!(detail.enhanced_match);
    assert!(!detail.classic_match);

    let stats = sniffer.statistics().counters;
    assert_eq!(stats.breaks_detected, 1);
    assert_eq!(stats.sync_detected, 1);
    assert_eq!(stats.frames_recovered, 1);
    assert_eq!(stats.captured, 1);
    assert_eq!(stats.invalid_checksum, 0);
    assert_eq!(stats.bytes_observed, 6);
    Ok(())
}

#[test]
fn misconfigured_length_shifts_checksum() -> Result<()> {
    let line = Line::new();
    let mut master = FakeLinMaster::starting_at(1_000);
    // The frame is really two bytes long, two more bytes follow on the wire.
    master.break_field().bytes(&[0x00, 0x55, 0xB1, 0x0C, 0x00, 0x42, 0x10, 0x20]);

    let sniffer = run(&line, lin_config(LengthTable::from_pairs([(0x31, 4)])?), &master)?;
    let records = records(&sniffer)?;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].identifier, 0x31);
    assert_eq!(records[0].payload.as_slice(), &[0x0C, 0x00, 0x42, 0x10]);
    assert_eq!(records[0].checksum.map(|c| c.observed), Some(0x20));
    assert!(!records[0].integrity_valid);
    assert_eq!(sniffer.statistics().counters.invalid_checksum, 1);
    Ok(())
}

#[test]
fn misconfigured_length_aborted_by_next_break() -> Result<()> {
    let line = Line::new();
    let mut master = FakeLinMaster::starting_at(1_000);
    master
        .frame(0xB1, &[0x0C, 0x00], 0x42)
        .enhanced_frame(0x10, &[0x01, 0x02]);

    let sniffer = run(&line, lin_config(LengthTable::from_pairs([(0x31, 4)])?), &master)?;
    let records = records(&sniffer)?;

    // Still waiting for data when the next header arrives.
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].identifier, 0x10);
    assert!(records[0].integrity_valid);
    assert_eq!(sniffer.statistics().counters.break_aborts, 1);
    Ok(())
}

#[test]
fn stall_mid_frame_then_recover() -> Result<()> {
    println!("\nStall: header only, 60 ms of silence, then a good frame");

    let line = Line::new();
    let mut master = FakeLinMaster::starting_at(1_000);
    master
        .break_field()
        .bytes(&[0x00, 0x55, 0xB1])
        .idle(60_000)
        .frame(0xB1, &[0x0C, 0x00], 0x42);

    let sniffer = run(&line, lin_config(LengthTable::from_pairs([(0x31, 2)])?), &master)?;
    let records = records(&sniffer)?;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].payload.as_slice(), &[0x0C, 0x00]);
    assert!(records[0].integrity_valid);

    let stats = sniffer.statistics().counters;
    println!("  stall timeouts: {}", stats.stall_timeouts);
    assert_eq!(stats.stall_timeouts, 1);
    assert_eq!(stats.break_aborts, 0);
    assert_eq!(stats.frames_recovered, 1);
    Ok(())
}

#[test]
fn either_checksum_convention_is_valid() -> Result<()> {
    let data = [0x12, 0x34];
    let pid = checksum::protected_id(0x10);
    let classic = checksum::classic_checksum(&data);
    let enhanced = checksum::enhanced_checksum(pid, &data);
    assert_ne!(classic, enhanced);
    let wrong = (0..=u8::MAX)
        .find(|c| *c != classic && *c != enhanced)
        .expect("a byte matching neither checksum");

    let line = Line::new();
    let mut master = FakeLinMaster::starting_at(1_000);
    master
        .frame(pid, &data, classic)
        .frame(pid, &data, enhanced)
        .frame(pid, &data, wrong);

    let sniffer = run(&line, lin_config(LengthTable::new()), &master)?;
    let records = records(&sniffer)?;

    assert_eq!(records.len(), 3);
    assert!(records[0].integrity_valid);
    assert!(records[0].checksum.is_some_and(|c| c.classic_match && !c.enhanced_match));
    assert!(records[1].integrity_valid);
    assert!(records[1].checksum.is_some_and(|c| c.enhanced_match && !c.classic_match));
    assert!(!records[2].integrity_valid);

    let stats = sniffer.statistics().counters;
    assert_eq!(stats.frames_recovered, 3);
    assert_eq!(stats.invalid_checksum, 1);
    Ok(())
}

#[test]
fn gap_inferred_start_without_break_flag() -> Result<()> {
    let line = Line::new();
    let mut master = FakeLinMaster::starting_at(1_000);
    // The break interrupt never fires; only the sentinel zero shows up.
    master.bytes(&[0x00, 0x55, 0xB1, 0x0C, 0x00, 0x42]);

    let sniffer = run(&line, lin_config(LengthTable::from_pairs([(0x31, 2)])?), &master)?;
    let records = records(&sniffer)?;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].identifier, 0x31);
    assert!(records[0].integrity_valid);
    // Stamped at the zero byte that stood in for the break.
    assert_eq!(records[0].timestamp_us, 1_000);

    let stats = sniffer.statistics().counters;
    assert_eq!(stats.breaks_detected, 0);
    assert_eq!(stats.inferred_breaks, 1);
    Ok(())
}

#[test]
fn parity_mismatch_is_counted_not_rejected() -> Result<()> {
    let line = Line::new();
    let mut master = FakeLinMaster::starting_at(1_000);
    // 0x31 without its parity bits.
    master.frame(0x31, &[0xAA, 0x55], checksum::enhanced_checksum(0x31, &[0xAA, 0x55]));

    let sniffer = run(&line, lin_config(LengthTable::from_pairs([(0x31, 2)])?), &master)?;
    let records = records(&sniffer)?;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].identifier, 0x31);
    assert!(records[0].integrity_valid);
    assert_eq!(sniffer.statistics().counters.parity_mismatches, 1);
    Ok(())
}

#[test]
fn payload_length_follows_table() -> Result<()> {
    let lengths = LengthTable::from_pairs([(0x05, 1), (0x3C, 8)])?;
    let ids = [0x05u8, 0x10, 0x22, 0x3C, 0x3B, 0x05];

    let line = Line::new();
    let mut master = FakeLinMaster::starting_at(1_000);
    for (n, &id) in ids.iter().enumerate() {
        let data: Vec<u8> = (0..lengths.len_for(id)).map(|i| i.wrapping_mul(n as u8 + 3)).collect();
        master.classic_frame(id, &data);
    }

    let sniffer = run(&line, lin_config(lengths.clone()), &master)?;
    let records = records(&sniffer)?;

    // Never more records than checksum bytes on the wire.
    assert_eq!(records.len(), ids.len());
    for (record, &id) in records.iter().zip(&ids) {
        assert_eq!(record.identifier, u32::from(id));
        assert_eq!(record.payload.len(), usize::from(lengths.len_for(id)));
        assert!(record.integrity_valid);
    }
    assert_eq!(records[1].payload.len(), 2);
    assert_eq!(records[2].payload.len(), 4);
    assert_eq!(records[4].payload.len(), 8);
    Ok(())
}

#[test]
fn garbage_between_frames_is_ignored() -> Result<()> {
    let line = Line::new();
    let mut master = FakeLinMaster::starting_at(1_000);
    master
        .bytes(&[0x13, 0x37, 0xFF])
        .idle(3_000)
        .enhanced_frame(0x31, &[0x0C, 0x00])
        .bytes(&[0x99]);

    let sniffer = run(&line, lin_config(LengthTable::from_pairs([(0x31, 2)])?), &master)?;
    let records = records(&sniffer)?;

    assert_eq!(records.len(), 1);
    assert!(records[0].integrity_valid);
    assert_eq!(sniffer.statistics().counters.bytes_observed, 3 + 6 + 1);
    Ok(())
}
