fn main() {
    // ESP-IDF link arguments come from embuild; host builds have nothing to do.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
