mod ascii_scan;
mod descriptors;
