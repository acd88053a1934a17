fn main() {
    // Static assets are embedded at compile time; rebuild when they change
    println!("cargo:rerun-if-changed=static");

    // Enables static linking of the vcruntime library on Windows builds
    static_vcruntime::metabuild();
}
