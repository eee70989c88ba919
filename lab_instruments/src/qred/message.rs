use num_derive::FromPrimitive;

#[derive(FromPrimitive, Debug, PartialEq, Eq, Clone, Copy)]
pub enum MsgType {
    Command = 0x00,
    Parameter = 0x01,
    Property = 0x02,
    Value = 0x03,
    Data = 0x04,
}

#[derive(FromPrimitive, Debug, PartialEq, Eq, Clone, Copy)]
pub enum MsgKind {
    Get = 0x00,
    Set = 0x01,
    Min = 0x02,
    Max = 0x03,
    Def = 0x04,
    Type = 0x08,
    Name = 0x09,
    Unit = 0x0A,
    Length = 0x0F,
}

#[derive(FromPrimitive, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Command {
    Init = 0x00,
    Bye = 0x01,
    SysReset = 0x02,
    ParamReset = 0x03,
    StartExposure = 0x04,
    StopExposure = 0x05,
}

/// Live measurements, read with [`MsgType::Value`]
#[derive(FromPrimitive, Debug, PartialEq, Eq, Clone, Copy)]
pub enum MeasurementValue {
    /// Bits 8 and up hold the number of spectra waiting in the device buffer
    Status = 0x00,
    SensorTemp = 0x01,
    IoPort = 0x02,
    Systick = 0x03,
    RemainingExposures = 0x04,
    BufferCount = 0x05,
    SinkTemp = 0x06,
    AnalogIn = 0x07,
    TecStatus = 0x08,
    CoolingCurrent = 0x09,
    CalWarning = 0x0A,
    VoltageSupply = 0x0B,
    VoltageUsb = 0x0C,
    VoltageAux = 0x0D,
    AuxOvercurrent = 0x0E,
    CoolingCurrentMax = 0x0F,
    DebugVal = 0x10,
    PowerPathTemp = 0x11,
}

#[derive(FromPrimitive, Debug, PartialEq, Eq, Clone, Copy)]
pub enum BulkData {
    Spectrum = 0x00,
    Wavelengths = 0x01,
    CalData = 0x02,
    UserData = 0x03,
    AuxInterface = 0x04,
    WavelengthCoeffs = 0x05,
    NonlinearityCoeffs = 0x06,
}

#[derive(FromPrimitive, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Property {
    DeviceId = 0x00,
    SerialNo = 0x01,
    Manufacturer = 0x02,
    Model = 0x03,
    HwVersion = 0x04,
    SwVersion = 0x05,
    SpectrumPeakValue = 0x06,
    PixelCount = 0x07,
    DataCount = 0x08,
    OffsetPixelFirst = 0x09,
    OffsetPixelCount = 0x0A,
    DarkPixelFirst = 0x0B,
    DarkPixelCount = 0x0C,
    RealPixelFirst = 0x0D,
    PixelsPerBinExponent = 0x0E,
    MirrorSpectrum = 0x0F,
    SensorType = 0x10,
    OpticalConfig = 0x11,
    BadPixels0 = 0x16,
    BadPixels1 = 0x17,
    BadPixels2 = 0x18,
    BadPixels3 = 0x19,
    PageCountCalData = 0x1A,
    PageCountUserData = 0x1B,
    ReadoutNoise = 0x1C,
}

#[derive(FromPrimitive, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Parameter {
    /// Microseconds
    ExposureTime = 0x00,
    Averaging = 0x01,
    ProcessingSteps = 0x02,
    ConfigIo = 0x03,
    ConfigTrigger = 0x04,
    TriggerDelay = 0x05,
    TriggerEnableExternal = 0x06,
    Baudrate = 0x07,
    TurnOffLeds = 0x08,
    PulsePeriod = 0x09,
    /// Degrees Celsius, float
    TempTarget = 0x0A,
    TempEnableControl = 0x0B,
    SampleClockDelay = 0x0C,
    SensorGain = 0x0D,
    AnalogOut = 0x0E,
    /// Degrees Celsius, float
    TempLimitSink = 0x0F,
}

#[derive(FromPrimitive, Debug, PartialEq, Eq, Clone, Copy)]
pub enum ReturnCode {
    Ok = 0x00,
    UnknownCommand = 0x01,
    InvalidParameter = 0x02,
    MissingParameter = 0x03,
    InvalidOperation = 0x04,
    NotSupported = 0x05,
    InvalidPasscode = 0x06,
    CommunicationError = 0x07,
    InternalError = 0x08,
    UnknownBootloaderCommand = 0x09,
}

/// Thermo-electric cooler loop state. Firmware skips the value 4.
#[derive(FromPrimitive, Debug, PartialEq, Eq, Clone, Copy)]
pub enum TecStatus {
    Disabled = 0x00,
    SetpointReached = 0x01,
    Approaching = 0x02,
    UnableToReach = 0x03,
    SinkTooHot = 0x05,
}

/// Body of a request, its family decides the message type
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Identifier {
    Command(Command),
    Parameter(Parameter),
    Property(Property),
    Value(MeasurementValue),
    Data(BulkData),
}

impl Identifier {
    pub fn msg_type(&self) -> MsgType {
        match self {
            Identifier::Command(_) => MsgType::Command,
            Identifier::Parameter(_) => MsgType::Parameter,
            Identifier::Property(_) => MsgType::Property,
            Identifier::Value(_) => MsgType::Value,
            Identifier::Data(_) => MsgType::Data,
        }
    }

    pub fn code(&self) -> u8 {
        match *self {
            Identifier::Command(c) => c as u8,
            Identifier::Parameter(p) => p as u8,
            Identifier::Property(p) => p as u8,
            Identifier::Value(v) => v as u8,
            Identifier::Data(d) => d as u8,
        }
    }
}

macro_rules! impl_identifier_from {
    ($($family:ident),*) => {
        $(
            impl From<$family> for Identifier {
                fn from(value: $family) -> Self {
                    Identifier::$family(value)
                }
            }
        )*
    };
}

impl_identifier_from!(Command, Parameter, Property);

impl From<MeasurementValue> for Identifier {
    fn from(value: MeasurementValue) -> Self {
        Identifier::Value(value)
    }
}

impl From<BulkData> for Identifier {
    fn from(value: BulkData) -> Self {
        Identifier::Data(value)
    }
}

/// 32-bit message id: `type << 12 | kind << 8 | identifier`
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct RequestWord(u32);

impl RequestWord {
    pub fn new(kind: MsgKind, identifier: impl Into<Identifier>) -> Self {
        let identifier = identifier.into();
        RequestWord(
            (identifier.msg_type() as u32) << 12 | (kind as u32) << 8 | identifier.code() as u32,
        )
    }

    pub fn get(identifier: impl Into<Identifier>) -> Self {
        Self::new(MsgKind::Get, identifier)
    }

    pub fn set(identifier: impl Into<Identifier>) -> Self {
        Self::new(MsgKind::Set, identifier)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Wire form, little-endian
    pub fn encode(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// The initialization command is the only request answered by a bare status word
    pub fn is_init(self) -> bool {
        self.0 == 0
    }
}

/// Formats a request word from its parts
pub fn encode_request(kind: MsgKind, identifier: impl Into<Identifier>) -> [u8; 4] {
    RequestWord::new(kind, identifier).encode()
}
