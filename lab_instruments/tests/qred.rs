use claims::*;
use lab_instruments::{
    qred::{IntensityUnit, TecStatus},
    Error, ProtocolError, Qred, QredConfig, RetryPolicy, Spectrometer, ValidationError,
};
use pretty_assertions::assert_eq;
use utilities::{QredSim, QRED_SPECTRUM_RESPONSE};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config() -> QredConfig {
    QredConfig {
        retry: RetryPolicy::immediate(Some(5)),
        ..Default::default()
    }
}

#[test]
fn open_fills_caches() {
    init_logger();
    let sim = QredSim::new(16);
    let mut qred = Qred::open(sim, config()).unwrap();
    assert_ok_eq!(qred.get_pixel_count(), 16);
    assert_ok_eq!(qred.get_exposure_time_min_us(), 10);
    assert_ok_eq!(qred.get_exposure_time_max_us(), 10_000_000);
    assert_ok_eq!(qred.get_averaging_max(), 1000);

    let wavelengths = qred.get_wavelength_mapping().unwrap();
    assert_eq!(wavelengths.len(), 16);
    assert_eq!(wavelengths[2], 401.0);

    let sim = qred.terminate().unwrap();
    // Init, 6 cached queries and BYE
    assert_eq!(sim.writes.len(), 8);
    assert_eq!(sim.writes.last().unwrap(), &vec![0x01, 0x00, 0x00, 0x00]);
}

#[test]
fn identification() {
    init_logger();
    let mut qred = Qred::new(QredSim::new(16), config());
    assert_ok_eq!(qred.get_serial_number(), "QRD-0042".to_string());
    assert_ok_eq!(qred.get_hw_version(), "1.2.3.4".to_string());
}

#[test]
fn short_replies_are_retried() {
    init_logger();
    let mut sim = QredSim::new(2048);
    sim.short_replies = 3;
    let mut qred = Qred::new(sim, config());
    assert_ok_eq!(qred.get_pixel_count(), 2048);
    let sim = qred.terminate().unwrap();
    // Four attempts and BYE
    assert_eq!(sim.writes.len(), 5);
}

#[test]
fn retry_limit_surfaces_short_response() {
    init_logger();
    let mut sim = QredSim::new(2048);
    sim.short_replies = 10;
    let mut qred = Qred::new(sim, config());
    assert_matches!(
        qred.get_pixel_count(),
        Err(Error::Protocol(ProtocolError::ShortResponse { len: 4 }))
    );
}

#[test]
fn exposure_round_trip() {
    init_logger();
    let mut qred = Qred::open(QredSim::new(16), config()).unwrap();
    assert_ok!(qred.set_exposure_time_ms(250.0));
    assert_ok_eq!(qred.get_exposure_time_us(), 250_000);
    assert_ok_eq!(qred.get_exposure_time_ms(), 250.0);

    assert_matches!(
        qred.set_exposure_time_us(10_000_001),
        Err(Error::Validation(ValidationError::OutOfRange { .. }))
    );
    // Rejected value never reached the device
    assert_ok_eq!(qred.get_exposure_time_us(), 250_000);
}

#[test]
fn averaging_round_trip() {
    init_logger();
    let mut qred = Qred::open(QredSim::new(16), config()).unwrap();
    assert_ok!(qred.set_averaging(8));
    assert_ok_eq!(qred.get_averaging(), 8);
    assert_err!(qred.set_averaging(1001));
}

#[test]
fn tec_status() {
    init_logger();
    let mut sim = QredSim::new(16);
    sim.tec_status = 5;
    let mut qred = Qred::new(sim, config());
    assert_ok_eq!(qred.get_tec_status(), TecStatus::SinkTooHot);
}

#[test]
fn recorded_spectrum() {
    init_logger();
    let mut sim = QredSim::new(16);
    sim.spectrum_response = QRED_SPECTRUM_RESPONSE.clone();
    let mut qred = Qred::new(sim, config());

    let spectrum = qred.spectrum().unwrap();
    assert_eq!(spectrum.header.exposure_time, 5_000_000);
    assert_eq!(spectrum.header.averaging, 4);
    assert_eq!(spectrum.header.pixel_count, 16);
    assert_eq!(spectrum.header.intensity_unit, IntensityUnit::AdcNormalized);
    assert_eq!(spectrum.header.temperature, -4.75);
    assert_eq!(spectrum.amplitudes.len(), 16);
    assert_eq!(spectrum.amplitudes[0], 1800.0);
    assert_eq!(spectrum.amplitudes[8], 1000.0);
}

#[test]
fn unknown_request_logs_and_returns_payload() {
    init_logger();
    let mut qred = Qred::new(QredSim::new(16), config());
    // The simulator answers unsupported requests with UnknownCommand and four zero bytes
    assert_ok_eq!(qred.get_cooling_current(), 0.0);
}
