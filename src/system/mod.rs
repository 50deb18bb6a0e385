mod power;

pub use power::reboot;
