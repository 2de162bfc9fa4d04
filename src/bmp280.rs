
use log::debug;
use rppal::i2c::I2c;

use crate::sensor::{Reading, SensorError, SensorSource};

pub const DEFAULT_I2C_ADDR: u16 = 0x77;

const CHIP_ID: u8 = 0x58;

const REG_CALIB_START: u8 = 0x88;
const REG_CHIP_ID: u8 = 0xD0;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_CONFIG: u8 = 0xF5;
const REG_DATA_START: u8 = 0xF7;

// osrs_t[7:5] = x1, osrs_p[4:2] = x4, mode[1:0] = normal
const CTRL_MEAS_NORMAL: u8 = 0b001_011_11;
// t_sb[7:5] = 1000 ms standby (matches the 1 Hz tick), IIR filter off
const CONFIG_STANDBY_1S: u8 = 0b101_000_00;

/// Factory trimming parameters read once from registers 0x88..0x9F.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Calibration {
    dig_t1: u16,
    dig_t2: i16,
    dig_t3: i16,
    dig_p1: u16,
    dig_p2: i16,
    dig_p3: i16,
    dig_p4: i16,
    dig_p5: i16,
    dig_p6: i16,
    dig_p7: i16,
    dig_p8: i16,
    dig_p9: i16,
}

impl Calibration {
    fn from_registers(raw: &[u8; 24]) -> Self {
        let word = |i: usize| u16::from_le_bytes([raw[i], raw[i + 1]]);
        Self {
            dig_t1: word(0),
            dig_t2: word(2) as i16,
            dig_t3: word(4) as i16,
            dig_p1: word(6),
            dig_p2: word(8) as i16,
            dig_p3: word(10) as i16,
            dig_p4: word(12) as i16,
            dig_p5: word(14) as i16,
            dig_p6: word(16) as i16,
            dig_p7: word(18) as i16,
            dig_p8: word(20) as i16,
            dig_p9: word(22) as i16,
        }
    }

    /// Datasheet double-precision compensation. Returns (°C, Pa). Pressure
    /// compensation is coupled to temperature through `t_fine`.
    fn compensate(&self, adc_t: i32, adc_p: i32) -> (f64, f64) {
        let var1 = (adc_t as f64 / 16384.0 - self.dig_t1 as f64 / 1024.0) * self.dig_t2 as f64;
        let var2 = {
            let d = adc_t as f64 / 131072.0 - self.dig_t1 as f64 / 8192.0;
            d * d * self.dig_t3 as f64
        };
        let t_fine = var1 + var2;
        let temperature = t_fine / 5120.0;

        let mut var1 = t_fine / 2.0 - 64000.0;
        let mut var2 = var1 * var1 * self.dig_p6 as f64 / 32768.0;
        var2 += var1 * self.dig_p5 as f64 * 2.0;
        var2 = var2 / 4.0 + self.dig_p4 as f64 * 65536.0;
        var1 = (self.dig_p3 as f64 * var1 * var1 / 524288.0 + self.dig_p2 as f64 * var1)
            / 524288.0;
        var1 = (1.0 + var1 / 32768.0) * self.dig_p1 as f64;
        if var1 == 0.0 {
            // would divide by zero; Reading::validate rejects the result
            return (temperature, 0.0);
        }

        let mut pressure = 1048576.0 - adc_p as f64;
        pressure = (pressure - var2 / 4096.0) * 6250.0 / var1;
        let var1 = self.dig_p9 as f64 * pressure * pressure / 2147483648.0;
        let var2 = pressure * self.dig_p8 as f64 / 32768.0;
        pressure += (var1 + var2 + self.dig_p7 as f64) / 16.0;

        (temperature, pressure)
    }
}

/// Splits a 6-byte burst read of 0xF7..0xFC into the 20-bit raw pressure and
/// temperature ADC values.
fn split_raw_sample(raw: &[u8; 6]) -> (i32, i32) {
    let adc_p = ((raw[0] as i32) << 12) | ((raw[1] as i32) << 4) | ((raw[2] as i32) >> 4);
    let adc_t = ((raw[3] as i32) << 12) | ((raw[4] as i32) << 4) | ((raw[5] as i32) >> 4);
    (adc_t, adc_p)
}

/// Bosch BMP280 over the Pi's I²C bus.
pub struct Bmp280 {
    bus: I2c,
    calibration: Calibration,
}

impl Bmp280 {
    /// Probes the chip, loads the calibration block and switches to normal
    /// mode. Failure here is the one condition that aborts startup.
    pub fn new(i2c_bus: u8, addr: u16) -> Result<Self, SensorError> {
        let mut bus = I2c::with_bus(i2c_bus)?;
        bus.set_slave_address(addr)?;

        let id = bus.smbus_read_byte(REG_CHIP_ID)?;
        if id != CHIP_ID {
            return Err(SensorError::UnknownChip(id));
        }

        let mut raw = [0u8; 24];
        bus.block_read(REG_CALIB_START, &mut raw)?;
        let calibration = Calibration::from_registers(&raw);

        bus.smbus_write_byte(REG_CONFIG, CONFIG_STANDBY_1S)?;
        bus.smbus_write_byte(REG_CTRL_MEAS, CTRL_MEAS_NORMAL)?;
        debug!("BMP280 ready on i2c bus {i2c_bus}, address {addr:#04x}");

        Ok(Self { bus, calibration })
    }
}

impl SensorSource for Bmp280 {
    fn read(&mut self) -> Result<Reading, SensorError> {
        let mut raw = [0u8; 6];
        self.bus.block_read(REG_DATA_START, &mut raw)?;
        let (adc_t, adc_p) = split_raw_sample(&raw);
        let (temperature, pressure_pa) = self.calibration.compensate(adc_t, adc_p);
        Reading {
            temperature,
            pressure: pressure_pa / 100.0,
        }
        .validate()
    }
}
