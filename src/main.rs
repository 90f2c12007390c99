fn main() {
    std::process::exit(readiness_gate_lib::run())
}
