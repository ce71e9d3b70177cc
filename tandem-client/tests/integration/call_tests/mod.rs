mod test_call_over_server;
