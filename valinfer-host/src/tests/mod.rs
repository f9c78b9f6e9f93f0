mod test_resolution;
