fn main() {
    orderer::main()
}
