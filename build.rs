fn main() {
    // Propagate the ESP-IDF build environment to the linker; a no-op for
    // host builds where the `espidf` feature is off.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
