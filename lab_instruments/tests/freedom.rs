use claims::*;
use lab_instruments::{
    freedom::{LinearityCoefficients, Register},
    Error, Freedom, FreedomConfig, ProtocolError, Spectrometer,
};
use pretty_assertions::assert_eq;
use utilities::{MockBus, RegisterMap, FREEDOM_CALIBRATION};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn open(map: RegisterMap) -> Freedom<RegisterMap> {
    Freedom::open(map, FreedomConfig::default()).unwrap()
}

#[test]
fn open_loads_calibration() {
    init_logger();
    let mut freedom = open(RegisterMap::new(2048, &FREEDOM_CALIBRATION));
    let calibration = freedom.calibration().unwrap();
    assert_eq!(calibration.wavelength.0[0], 531.25);
    assert_eq!(calibration.linearity.a, 1.0);
    assert_eq!(calibration.linearity.b[0], 2.5e-5);

    let wavelengths = freedom.wavelength_mapping().unwrap();
    assert_eq!(wavelengths.len(), 2048);
    assert_eq!(wavelengths[0], 531.25);
    // B1 + B2 = 0.09375 nm per pixel
    assert!((wavelengths[100] - 540.625).abs() < 1e-9);
}

#[test]
fn wavelength_only_calibration() {
    init_logger();
    let mut freedom = open(RegisterMap::new(2048, &FREEDOM_CALIBRATION[..84]));
    let calibration = freedom.calibration().unwrap();
    assert_eq!(calibration.linearity, LinearityCoefficients::default());
}

#[test]
fn calibration_can_be_reread() {
    init_logger();
    let mut freedom = open(RegisterMap::new(2048, &FREEDOM_CALIBRATION));
    let first = freedom.calibration().unwrap();
    // Reading the char count rewinds the device pointer
    assert_eq!(freedom.load_calibration().unwrap(), first);
}

#[test]
fn too_short_calibration_fails_open() {
    init_logger();
    let map = RegisterMap::new(2048, &FREEDOM_CALIBRATION[..70]);
    assert_matches!(
        Freedom::open(map, FreedomConfig::default()).err(),
        Some(Error::Encoding(_))
    );
}

#[test]
fn pixel_count_check_can_be_skipped() {
    init_logger();
    let config = FreedomConfig {
        expected_pixel_count: None,
    };
    let freedom = Freedom::open(RegisterMap::new(512, &FREEDOM_CALIBRATION), config);
    assert!(freedom.is_ok());

    let freedom = Freedom::open(RegisterMap::new(512, &FREEDOM_CALIBRATION), Default::default());
    assert_matches!(
        freedom.err(),
        Some(Error::Protocol(ProtocolError::UnexpectedPixelCount { .. }))
    );
}

#[test]
fn settings_reach_registers() {
    init_logger();
    let mut freedom = open(RegisterMap::new(2048, &FREEDOM_CALIBRATION));

    assert_ok!(freedom.set_exposure_time_ns(50_000_000));
    assert_ok_eq!(freedom.get_exposure_time_ns(), 50_000_000);

    assert_ok!(freedom.set_trigger_delay_ns(20_000_000));
    assert_ok_eq!(freedom.get_trigger_delay_ns(), 20_000_000);

    assert_ok!(freedom.set_adc_offset_mv(-150.0));
    // 128/255 of full scale
    assert!((freedom.get_adc_offset_mv().unwrap() + 150.588).abs() < 1e-3);

    assert_ok!(freedom.set_data_ready_threshold(0x200));
    assert_ok_eq!(freedom.get_data_ready_threshold(), 0x200);

    let map = freedom.release();
    assert_eq!(map.register(Register::ExposureMsb), 3);
    assert_eq!(map.register(Register::AdcOffset), 128);
}

#[test]
fn corrected_and_raw_spectrum() {
    init_logger();
    let mut map = RegisterMap::new(4, &FREEDOM_CALIBRATION);
    map.pixels.extend([0, 1000, 40000, 65535]);
    map.pixels.extend([0, 1000, 40000, 65535]);
    let config = FreedomConfig {
        expected_pixel_count: Some(4),
    };
    let mut freedom = Freedom::open(map, config).unwrap();

    let raw = freedom.get_spectrum(false).unwrap();
    assert_eq!(raw, vec![0.0, 1000.0, 40000.0, 65535.0]);

    let corrected = freedom.get_spectrum(true).unwrap();
    assert_eq!(corrected[0], 0.0);
    // v / (1 + 2.5e-5 * v)
    assert!((corrected[2] - 20000.0).abs() < 1e-9);
}

#[test]
fn info_collects_registers() {
    init_logger();
    let mut freedom = open(RegisterMap::new(2048, &FREEDOM_CALIBRATION));
    let info = freedom.info().unwrap();
    assert_eq!(info.serial_number, 4711);
    assert_eq!(info.hw_version, 3);
    assert_eq!(info.gain, 6.0);
    assert_eq!(info.adc_offset_mv, 0.0);
    assert_eq!(info.calibration_chars, 196);
    assert_eq!(info.exposure_time_ns, 9600);
    assert!(info.to_string().starts_with("Serial No: 4711\nHW version: 3\n"));
    assert!((freedom.get_sensor_temp().unwrap() - 25.0).abs() < 0.05);
}

#[test]
fn bus_failure_propagates() {
    init_logger();
    let mut bus = MockBus::new();
    bus.expect_exchange().returning(|_, _| Err(Error::BusError));
    let mut freedom = Freedom::new(bus, FreedomConfig::default());
    assert_matches!(freedom.get_serial_number(), Err(Error::BusError));
}
