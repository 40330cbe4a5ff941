fn main() -> Result<(), Box<dyn std::error::Error>> {
    move_fmt::lib_main()
}
