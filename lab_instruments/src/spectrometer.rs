use crate::{
    error::Result,
    freedom::Freedom,
    io_adapter::{RegisterBus, Transport},
    qred::{Qred, Spectrum},
    rock::{CaptureType, OutputFormat, Rock},
};

/// Operations shared by every spectrometer family, for code that only needs a spectrum and its
/// wavelength axis
pub trait Spectrometer {
    type Spectrum;

    fn pixel_count(&mut self) -> Result<u32>;
    /// One acquisition with whatever settings the device currently holds
    fn spectrum(&mut self) -> Result<Self::Spectrum>;
    /// Wavelength of every pixel in nanometers
    fn wavelength_mapping(&mut self) -> Result<Vec<f64>>;
}

impl<T: Transport> Spectrometer for Qred<T> {
    type Spectrum = Spectrum;

    fn pixel_count(&mut self) -> Result<u32> {
        self.get_pixel_count()
    }

    fn spectrum(&mut self) -> Result<Spectrum> {
        self.get_spectrum()
    }

    fn wavelength_mapping(&mut self) -> Result<Vec<f64>> {
        Ok(self
            .get_wavelength_mapping()?
            .into_iter()
            .map(f64::from)
            .collect())
    }
}

impl<B: RegisterBus> Spectrometer for Freedom<B> {
    type Spectrum = Vec<f64>;

    fn pixel_count(&mut self) -> Result<u32> {
        self.get_pixels_per_image().map(u32::from)
    }

    fn spectrum(&mut self) -> Result<Vec<f64>> {
        self.get_spectrum(true)
    }

    fn wavelength_mapping(&mut self) -> Result<Vec<f64>> {
        self.get_wavelength_mapping()
    }
}

impl<T: Transport> Spectrometer for Rock<T> {
    type Spectrum = Vec<i64>;

    fn pixel_count(&mut self) -> Result<u32> {
        self.get_pixel_count()
    }

    fn spectrum(&mut self) -> Result<Vec<i64>> {
        self.fetch_last(CaptureType::Light, OutputFormat::AsciiWithSpaces)
    }

    fn wavelength_mapping(&mut self) -> Result<Vec<f64>> {
        self.get_wavelength_mapping()
    }
}
