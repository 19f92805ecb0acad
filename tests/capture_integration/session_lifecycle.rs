//! Session lifecycle: capacity, reset, commands and dual-bus capture

use bus_sniffer::lin::LengthTable;
use bus_sniffer::{
    Bus, CanFrame, Command, Error, MonitorTarget, Response, Result, SessionState, SnifferConfig,
};

use super::{FakeLinMaster, Line, play, sniffer};

#[test]
fn full_buffer_rejects_and_keeps_oldest() -> Result<()> {
    println!("\nCapacity: three slots, four frames");

    let line = Line::new();
    let config = SnifferConfig::default()
        .with_monitor(MonitorTarget::ByteStream)
        .with_capacity(3);
    let mut sniffer = sniffer(&line, config);

    let mut master = FakeLinMaster::starting_at(1_000);
    for id in [0x01, 0x02, 0x03, 0x04] {
        master.enhanced_frame(id, &[id, id]);
    }

    sniffer.start();
    play(&mut sniffer, &line, &master);
    assert_eq!(sniffer.session().state(), SessionState::BufferFull);

    // Stop leaves the terminal state alone.
    sniffer.stop();
    assert!(sniffer.session().is_buffer_full());

    let ids: Vec<u32> = sniffer.session().records()?.map(|r| r.identifier).collect();
    assert_eq!(ids, [0x01, 0x02, 0x03]);

    let snapshot = sniffer.statistics();
    println!("  captured {} dropped {}", snapshot.counters.captured, snapshot.counters.dropped);
    assert_eq!(snapshot.counters.frames_recovered, 4);
    assert_eq!(snapshot.counters.captured, 3);
    assert_eq!(snapshot.counters.dropped, 1);
    assert_eq!(snapshot.buffered, 3);
    assert_eq!(snapshot.capacity, 3);
    Ok(())
}

#[test]
fn can_capacity_counts_every_rejection() -> Result<()> {
    let line = Line::new();
    let config = SnifferConfig::default()
        .with_monitor(MonitorTarget::FrameBus)
        .with_capacity(2);
    let mut sniffer = sniffer(&line, config);

    sniffer.start();
    for id in 0x100..0x105 {
        line.put_can(CanFrame::standard(id, &[0xAA]).expect("valid frame"));
    }
    line.clock.advance(100);
    sniffer.poll();
    sniffer.stop();

    let stats = sniffer.statistics().counters;
    assert_eq!(stats.frames_observed, 5);
    assert_eq!(stats.captured, 2);
    assert_eq!(stats.dropped, 3);
    Ok(())
}

#[test]
fn reset_yields_empty_session() -> Result<()> {
    let line = Line::new();
    let mut sniffer = sniffer(&line, SnifferConfig::default());

    let mut master = FakeLinMaster::starting_at(1_000);
    master.enhanced_frame(0x10, &[1, 2]);
    line.put_can(CanFrame::standard(0x200, &[3]).expect("valid frame"));

    sniffer.start();
    assert!(matches!(sniffer.reset(), Err(Error::SessionRunning)));
    play(&mut sniffer, &line, &master);
    sniffer.stop();
    assert_eq!(sniffer.session().len(), 2);

    sniffer.reset()?;
    let snapshot = sniffer.statistics();
    assert!(snapshot.counters.is_zero());
    assert_eq!(snapshot.buffered, 0);
    assert_eq!(snapshot.elapsed_us, 0);
    assert_eq!(sniffer.session().entries()?.count(), 0);

    // Again, from Idle.
    sniffer.reset()?;
    assert!(sniffer.statistics().counters.is_zero());
    Ok(())
}

#[test]
fn both_buses_share_one_buffer() -> Result<()> {
    let line = Line::new();
    let config = SnifferConfig::default()
        .with_lengths(LengthTable::from_pairs([(0x31, 2)])?)
        .with_can_bitrate(250_000);
    let mut sniffer = sniffer(&line, config);
    assert_eq!(sniffer.source().listen_only, Some(250_000));

    sniffer.start();
    line.put_can(CanFrame::extended(0x18FE_F100, &[1, 2, 3]).expect("valid frame"));
    let mut master = FakeLinMaster::starting_at(1_000);
    master.frame(0xB1, &[0x0C, 0x00], 0x42);
    play(&mut sniffer, &line, &master);
    line.put_can(CanFrame::standard(0x7E8, &[]).expect("valid frame"));
    line.clock.advance(10);
    sniffer.poll();
    sniffer.stop();

    let buses: Vec<Bus> = sniffer.session().records()?.map(|r| r.bus).collect();
    assert_eq!(buses, [Bus::Can, Bus::Lin, Bus::Can]);

    let records: Vec<_> = sniffer.session().records()?.collect();
    assert!(records[0].flags.is_extended());
    assert_eq!(records[0].identifier, 0x18FE_F100);
    assert!(records[2].payload.is_empty());
    assert!(records.iter().all(|r| r.integrity_valid));
    // Session-relative and in capture order.
    assert!(records.windows(2).all(|w| w[0].timestamp_us <= w[1].timestamp_us));
    Ok(())
}

#[test]
fn frames_counted_outside_session() -> Result<()> {
    let line = Line::new();
    let mut sniffer = sniffer(&line, SnifferConfig::default());

    line.put_can(CanFrame::standard(0x123, &[0]).expect("valid frame"));
    sniffer.poll();

    let snapshot = sniffer.statistics();
    assert_eq!(snapshot.counters.frames_observed, 1);
    assert_eq!(snapshot.counters.captured, 0);
    assert_eq!(sniffer.session().state(), SessionState::Idle);
    Ok(())
}

#[test]
fn command_interface() -> Result<()> {
    let line = Line::new();
    let mut sniffer = sniffer(&line, SnifferConfig::default());

    assert_eq!(sniffer.apply(Command::Start)?, Response::Ok);
    line.put_can(CanFrame::standard(0x321, &[9, 9]).expect("valid frame"));
    line.clock.advance(2_500);
    sniffer.poll();
    assert_eq!(sniffer.apply(Command::Stop)?, Response::Ok);

    let Response::Statistics(snapshot) = sniffer.apply(Command::Statistics)? else {
        panic!("expected a statistics report");
    };
    assert_eq!(snapshot.counters.captured, 1);
    assert_eq!(snapshot.elapsed_us, 2_500);

    assert_eq!(sniffer.apply(Command::Reset)?, Response::Ok);
    assert_eq!(sniffer.session().state(), SessionState::Idle);
    Ok(())
}
