mod test_border_basic;
mod test_generator_basic;
mod test_query_basic;
mod test_subdivision_basic;
mod test_tracer_basic;
