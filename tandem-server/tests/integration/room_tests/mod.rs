mod test_admission;
