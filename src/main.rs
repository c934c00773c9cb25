fn main() {
    gtsf_intake_lib::run()
}
