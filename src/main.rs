fn main() -> std::process::ExitCode {
    leafcheck_lib::run()
}
