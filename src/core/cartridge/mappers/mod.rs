//! Implementations of the cartridge address layouts.
//! See [Mapper][super::Mapper].
mod lorom;
pub use lorom::LoRom;
mod big_lorom;
pub use big_lorom::BigLoRom;
mod hirom;
pub use hirom::HiRom;
mod exhirom;
pub use exhirom::ExHiRom;
